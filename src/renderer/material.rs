use glam::Vec3;

/// The closed set of untextured surface finishes. Objects carry either one of
/// these or a texture, never both.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Gold,
    Emerald,
    Plastic,
}

/// Phong constants for a material.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MaterialProps {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl MaterialKind {
    pub fn props(self) -> MaterialProps {
        match self {
            MaterialKind::Gold => MaterialProps {
                ambient: Vec3::new(0.24725, 0.1995, 0.0745),
                diffuse: Vec3::new(0.75164, 0.60648, 0.22648),
                specular: Vec3::new(0.628_281, 0.555_802, 0.366_065),
                shininess: 0.4 * 128.0,
            },
            MaterialKind::Emerald => MaterialProps {
                ambient: Vec3::new(0.0215, 0.1745, 0.0215),
                diffuse: Vec3::new(0.07568, 0.61424, 0.07568),
                specular: Vec3::new(0.633, 0.727_811, 0.633),
                shininess: 0.6 * 128.0,
            },
            MaterialKind::Plastic => MaterialProps {
                ambient: Vec3::new(0.0, 0.1, 0.06),
                diffuse: Vec3::new(0.0, 0.509_803_92, 0.509_803_92),
                specular: Vec3::new(0.501_960_78, 0.501_960_78, 0.501_960_78),
                shininess: 0.6 * 128.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_positive_shininess() {
        for kind in [MaterialKind::Gold, MaterialKind::Emerald, MaterialKind::Plastic] {
            assert!(kind.props().shininess > 0.0);
        }
    }

    #[test]
    fn gold_is_gold() {
        let props = MaterialKind::Gold.props();
        // warm hue: red dominates blue in the diffuse term
        assert!(props.diffuse.x > props.diffuse.z);
        assert_eq!(props.shininess, 51.2);
    }
}
