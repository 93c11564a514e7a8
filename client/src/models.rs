use glam::{Mat4, Quat, Vec3};

use crate::config::{BLOCK_SIZE, COIN_RADIUS, PLAYER_SIZE};
use crate::materials::MaterialId;
use crate::mesh::{MeshData, cuboid, cylinder, sphere};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelId {
    Mario,
    Coin,
    Cloud,
    QuestionBlock,
    UsedBlock,
}

impl ModelId {
    pub const ALL: [ModelId; 5] = [
        ModelId::Mario,
        ModelId::Coin,
        ModelId::Cloud,
        ModelId::QuestionBlock,
        ModelId::UsedBlock,
    ];

    pub fn build(self) -> Model {
        match self {
            ModelId::Mario => mario(),
            ModelId::Coin => coin(),
            ModelId::Cloud => cloud(),
            ModelId::QuestionBlock => block(MaterialId::Question),
            ModelId::UsedBlock => block(MaterialId::UsedBlock),
        }
    }
}

pub struct ModelPart {
    pub mesh: MeshData,
    pub material: MaterialId,
}

/// Geometry grouped by material so each material is one draw.
#[derive(Default)]
pub struct Model {
    pub parts: Vec<ModelPart>,
}

impl Model {
    pub fn add(&mut self, mesh: &MeshData, transform: Mat4, material: MaterialId) {
        let index = match self.parts.iter().position(|p| p.material == material) {
            Some(index) => index,
            None => {
                self.parts.push(ModelPart {
                    mesh: MeshData::default(),
                    material,
                });
                self.parts.len() - 1
            }
        };
        self.parts[index].mesh.append_transformed(mesh, transform);
    }

    pub fn add_box(&mut self, size: Vec3, center: Vec3, material: MaterialId) {
        self.add(&cuboid(size), Mat4::from_translation(center), material);
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.parts
            .iter()
            .filter_map(|p| p.mesh.bounds())
            .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)))
    }

    pub fn transform(&mut self, transform: Mat4) {
        for part in &mut self.parts {
            let mut moved = MeshData::default();
            moved.append_transformed(&part.mesh, transform);
            part.mesh = moved;
        }
    }
}

/// Voxel plumber facing +Z, rescaled to the player height with the soles
/// of the shoes at y = 0.
pub fn mario() -> Model {
    use MaterialId::*;
    let mut model = Model::default();
    let boxes: [([f32; 3], [f32; 3], MaterialId); 23] = [
        // head and hat
        ([0.7, 0.7, 0.7], [0.0, 1.4, 0.0], Skin),
        ([0.75, 0.3, 0.75], [0.0, 1.8, 0.0], MarioRed),
        ([0.8, 0.12, 0.4], [0.0, 1.68, 0.38], MarioRed),
        // face
        ([0.15, 0.15, 0.05], [-0.2, 1.45, 0.36], White),
        ([0.15, 0.15, 0.05], [0.2, 1.45, 0.36], White),
        ([0.08, 0.08, 0.05], [-0.2, 1.45, 0.38], Black),
        ([0.08, 0.08, 0.05], [0.2, 1.45, 0.38], Black),
        ([0.2, 0.2, 0.25], [0.0, 1.35, 0.4], Skin),
        ([0.6, 0.18, 0.18], [0.0, 1.25, 0.38], Black),
        // torso
        ([0.8, 0.8, 0.55], [0.0, 0.75, 0.0], MarioRed),
        ([0.85, 0.55, 0.58], [0.0, 0.5, 0.0], MarioBlue),
        ([0.18, 0.8, 0.58], [-0.28, 0.75, 0.0], MarioBlue),
        ([0.18, 0.8, 0.58], [0.28, 0.75, 0.0], MarioBlue),
        ([0.12, 0.12, 0.05], [-0.28, 0.9, 0.3], White),
        ([0.12, 0.12, 0.05], [0.28, 0.9, 0.3], White),
        // legs and shoes
        ([0.32, 0.65, 0.38], [-0.22, 0.12, 0.0], MarioBlue),
        ([0.32, 0.65, 0.38], [0.22, 0.12, 0.0], MarioBlue),
        ([0.38, 0.28, 0.55], [-0.22, -0.14, 0.12], Boot),
        ([0.38, 0.28, 0.55], [0.22, -0.14, 0.12], Boot),
        // arms and gloves
        ([0.28, 0.7, 0.28], [-0.55, 0.75, 0.0], MarioRed),
        ([0.28, 0.7, 0.28], [0.55, 0.75, 0.0], MarioRed),
        ([0.32, 0.32, 0.32], [-0.55, 0.4, 0.0], White),
        ([0.32, 0.32, 0.32], [0.55, 0.4, 0.0], White),
    ];
    for (size, center, material) in boxes {
        model.add_box(Vec3::from(size), Vec3::from(center), material);
    }

    if let Some((lo, hi)) = model.bounds() {
        let scale = PLAYER_SIZE.y / (hi.y - lo.y);
        model.transform(
            Mat4::from_scale(Vec3::splat(scale)) * Mat4::from_translation(Vec3::new(0.0, -lo.y, 0.0)),
        );
    }
    model
}

/// Gold disc standing upright, facing +Z.
pub fn coin() -> Model {
    let mut model = Model::default();
    model.add(
        &cylinder(COIN_RADIUS, 0.15, 32),
        Mat4::from_quat(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
        MaterialId::Coin,
    );
    model
}

pub fn cloud() -> Model {
    let mut model = Model::default();
    for (radius, center) in [
        (1.5, Vec3::ZERO),
        (1.2, Vec3::new(1.5, 0.3, 0.0)),
        (1.0, Vec3::new(-1.2, 0.2, 0.0)),
    ] {
        model.add(
            &sphere(radius, 16, 16),
            Mat4::from_translation(center),
            MaterialId::Cloud,
        );
    }
    model
}

pub fn block(material: MaterialId) -> Model {
    let mut model = Model::default();
    model.add_box(Vec3::splat(BLOCK_SIZE), Vec3::ZERO, material);
    model
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mario_stands_on_origin_at_player_height() {
        let model = mario();
        let (lo, hi) = model.bounds().unwrap();
        assert!(lo.y.abs() < 1e-4);
        assert!((hi.y - PLAYER_SIZE.y).abs() < 1e-4);
        // Face details sit on the +Z side.
        assert!(hi.z > -lo.z);
    }

    #[test]
    fn parts_are_merged_per_material() {
        let model = mario();
        let mut materials: Vec<_> = model.parts.iter().map(|p| p.material).collect();
        let total = materials.len();
        materials.dedup();
        assert_eq!(materials.len(), total);
        assert_eq!(total, 6);
    }

    #[test]
    fn coin_stands_upright() {
        let (lo, hi) = coin().bounds().unwrap();
        assert!((hi.y - COIN_RADIUS).abs() < 1e-4);
        assert!((hi.z - 0.075).abs() < 1e-4);
        assert!((lo.y + COIN_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn every_model_has_geometry() {
        for id in ModelId::ALL {
            let model = id.build();
            assert!(!model.parts.is_empty(), "{id:?}");
            assert!(model.parts.iter().all(|p| !p.mesh.is_empty()), "{id:?}");
        }
    }
}
