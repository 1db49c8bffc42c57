use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// One interleaved vertex as the pipeline consumes it.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
    pub texcoord: Vec2,
    pub normal: Vec3,
}

/// Exact structural identity of a vertex for deduplication: the bit patterns
/// of position, color, and texcoord. Normals do not participate; faces that
/// share a position but disagree on smoothing stay merged the way the mesh
/// loader emitted them.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexKey([u32; 8]);

impl Vertex {
    pub fn dedup_key(&self) -> VertexKey {
        VertexKey([
            self.position.x.to_bits(),
            self.position.y.to_bits(),
            self.position.z.to_bits(),
            self.color.x.to_bits(),
            self.color.y.to_bits(),
            self.color.z.to_bits(),
            self.texcoord.x.to_bits(),
            self.texcoord.y.to_bits(),
        ])
    }

    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription::default()
            .binding(0)
            .stride(std::mem::size_of::<Vertex>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        [
            vk::VertexInputAttributeDescription::default()
                .location(0)
                .binding(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(std::mem::offset_of!(Vertex, position) as u32),
            vk::VertexInputAttributeDescription::default()
                .location(1)
                .binding(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(std::mem::offset_of!(Vertex, color) as u32),
            vk::VertexInputAttributeDescription::default()
                .location(2)
                .binding(0)
                .format(vk::Format::R32G32_SFLOAT)
                .offset(std::mem::offset_of!(Vertex, texcoord) as u32),
            vk::VertexInputAttributeDescription::default()
                .location(3)
                .binding(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(std::mem::offset_of!(Vertex, normal) as u32),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(position: [f32; 3], texcoord: [f32; 2]) -> Vertex {
        Vertex {
            position: position.into(),
            color: Vec3::ONE,
            texcoord: texcoord.into(),
            normal: Vec3::Y,
        }
    }

    #[test]
    fn identical_triples_hash_to_the_same_key() {
        let a = vertex([1.0, 2.0, 3.0], [0.5, 0.5]);
        let b = vertex([1.0, 2.0, 3.0], [0.5, 0.5]);
        assert_eq!(a.dedup_key(), b.dedup_key());
        // and twice over the same vertex
        assert_eq!(a.dedup_key(), a.dedup_key());
    }

    #[test]
    fn key_distinguishes_every_participating_attribute() {
        let base = vertex([1.0, 2.0, 3.0], [0.5, 0.5]);
        let mut moved = base;
        moved.position.x = 1.5;
        assert_ne!(base.dedup_key(), moved.dedup_key());

        let mut tinted = base;
        tinted.color.y = 0.0;
        assert_ne!(base.dedup_key(), tinted.dedup_key());

        let mut shifted = base;
        shifted.texcoord.x = 0.25;
        assert_ne!(base.dedup_key(), shifted.dedup_key());
    }

    #[test]
    fn normals_do_not_participate_in_the_key() {
        let a = vertex([1.0, 2.0, 3.0], [0.5, 0.5]);
        let mut b = a;
        b.normal = Vec3::X;
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn attribute_offsets_cover_the_whole_stride() {
        let attrs = Vertex::attribute_descriptions();
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].offset, 24);
        assert_eq!(attrs[3].offset, 32);
        assert_eq!(Vertex::binding_description().stride, 44);
    }
}
