use std::collections::HashMap;
use std::path::Path;

use color_eyre::Result;
use glam::{Vec2, Vec3};

use crate::renderer::error::RendererError;
use crate::renderer::resources::vertex::Vertex;

/// CPU-side mesh: deduplicated vertices plus the index list that rebuilds
/// the original face stream.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Load a Wavefront OBJ through the external loader and repack its
    /// per-face attribute references into unique vertices.
    pub fn load_obj(path: &Path) -> Result<Self> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: false,
                ignore_points: true,
                ignore_lines: true,
                ..Default::default()
            },
        )
        .map_err(|source| RendererError::MeshLoad {
            path: path.display().to_string(),
            source,
        })?;

        let mut face_vertices = Vec::new();
        for model in &models {
            let mesh = &model.mesh;
            for (k, &vi) in mesh.indices.iter().enumerate() {
                let vi = vi as usize;
                let position = Vec3::new(
                    mesh.positions[3 * vi],
                    mesh.positions[3 * vi + 1],
                    mesh.positions[3 * vi + 2],
                );

                // OBJ texcoords are bottom-up, Vulkan samples top-down
                let texcoord = match mesh.texcoord_indices.get(k) {
                    Some(&ti) => {
                        let ti = ti as usize;
                        Vec2::new(mesh.texcoords[2 * ti], 1.0 - mesh.texcoords[2 * ti + 1])
                    }
                    None => Vec2::ZERO,
                };

                let normal = match mesh.normal_indices.get(k) {
                    Some(&ni) => {
                        let ni = ni as usize;
                        Vec3::new(
                            mesh.normals[3 * ni],
                            mesh.normals[3 * ni + 1],
                            mesh.normals[3 * ni + 2],
                        )
                    }
                    None => Vec3::Y,
                };

                face_vertices.push(Vertex {
                    position,
                    color: Vec3::ONE,
                    texcoord,
                    normal,
                });
            }
        }

        let mesh = dedup_vertices(face_vertices);
        log::info!(
            "Loaded mesh {:?}: {} unique vertices, {} indices",
            path,
            mesh.vertices.len(),
            mesh.indices.len()
        );
        Ok(mesh)
    }

    /// Square quad of the given edge length in the XY plane, facing +Z,
    /// counter-clockwise winding.
    pub fn quad(extent: f32) -> Self {
        let h = extent / 2.0;
        let corners = [
            ([-h, -h, 0.0], [0.0, 1.0]),
            ([h, -h, 0.0], [1.0, 1.0]),
            ([h, h, 0.0], [1.0, 0.0]),
            ([-h, h, 0.0], [0.0, 0.0]),
        ];
        let face_vertices = [0, 1, 2, 2, 3, 0]
            .into_iter()
            .map(|i: usize| Vertex {
                position: corners[i].0.into(),
                color: Vec3::ONE,
                texcoord: corners[i].1.into(),
                normal: Vec3::Z,
            })
            .collect();
        dedup_vertices(face_vertices)
    }
}

/// Collapse a face-vertex stream into unique vertices. A vertex is reused
/// when its (position, color, texcoord) bit patterns have been seen before;
/// the first occurrence decides its index.
fn dedup_vertices(face_vertices: Vec<Vertex>) -> MeshData {
    let mut seen = HashMap::with_capacity(face_vertices.len());
    let mut vertices = Vec::new();
    let mut indices = Vec::with_capacity(face_vertices.len());

    for vertex in face_vertices {
        let index = *seen.entry(vertex.dedup_key()).or_insert_with(|| {
            vertices.push(vertex);
            (vertices.len() - 1) as u32
        });
        indices.push(index);
    }

    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_vertex(position: [f32; 3], texcoord: [f32; 2]) -> Vertex {
        Vertex {
            position: position.into(),
            color: Vec3::ONE,
            texcoord: texcoord.into(),
            normal: Vec3::Z,
        }
    }

    fn quad_face_stream() -> Vec<Vertex> {
        let corners = [
            ([-0.5, -0.5, 0.0], [0.0, 1.0]),
            ([0.5, -0.5, 0.0], [1.0, 1.0]),
            ([0.5, 0.5, 0.0], [1.0, 0.0]),
            ([-0.5, 0.5, 0.0], [0.0, 0.0]),
        ];
        [0, 1, 2, 2, 3, 0]
            .into_iter()
            .map(|i: usize| face_vertex(corners[i].0, corners[i].1))
            .collect()
    }

    #[test]
    fn quad_collapses_to_four_unique_vertices() {
        let mesh = dedup_vertices(quad_face_stream());
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn builtin_quad_spans_its_edge_length() {
        let mesh = MeshData::quad(30.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices.iter().any(|v| v.position.x == 15.0));
        assert!(mesh.vertices.iter().any(|v| v.position.x == -15.0));
    }

    #[test]
    fn unique_count_never_exceeds_reference_count_and_indices_stay_in_bounds() {
        let streams = [
            quad_face_stream(),
            vec![face_vertex([0.0; 3], [0.0; 2]); 17],
            (0..23)
                .map(|i| face_vertex([i as f32, 0.0, 0.0], [0.0; 2]))
                .collect(),
        ];
        for stream in streams {
            let refs = stream.len();
            let mesh = dedup_vertices(stream);
            assert!(mesh.vertices.len() <= refs);
            assert_eq!(mesh.indices.len(), refs);
            for &index in &mesh.indices {
                assert!((index as usize) < mesh.vertices.len());
            }
        }
    }

    #[test]
    fn first_occurrence_owns_the_index() {
        let stream = vec![
            face_vertex([1.0, 0.0, 0.0], [0.0; 2]),
            face_vertex([2.0, 0.0, 0.0], [0.0; 2]),
            face_vertex([1.0, 0.0, 0.0], [0.0; 2]),
        ];
        let mesh = dedup_vertices(stream);
        assert_eq!(mesh.indices, vec![0, 1, 0]);
    }

    #[test]
    fn dedup_is_deterministic() {
        let first = dedup_vertices(quad_face_stream());
        let second = dedup_vertices(quad_face_stream());
        assert_eq!(first, second);
        assert_eq!(
            bytemuck::cast_slice::<_, u8>(&first.vertices),
            bytemuck::cast_slice::<_, u8>(&second.vertices),
        );
    }
}
