use crate::textures::TextureKind;

/// Converts a 0xRRGGBB sRGB colour to linear RGB.
pub fn srgb_hex(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xFF) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialId {
    Brick,
    Ground,
    Question,
    UsedBlock,
    Pipe,
    Wall,
    MarioRed,
    MarioBlue,
    Skin,
    Boot,
    Black,
    White,
    Coin,
    Cloud,
}

impl MaterialId {
    pub const ALL: [MaterialId; 14] = [
        MaterialId::Brick,
        MaterialId::Ground,
        MaterialId::Question,
        MaterialId::UsedBlock,
        MaterialId::Pipe,
        MaterialId::Wall,
        MaterialId::MarioRed,
        MaterialId::MarioBlue,
        MaterialId::Skin,
        MaterialId::Boot,
        MaterialId::Black,
        MaterialId::White,
        MaterialId::Coin,
        MaterialId::Cloud,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn material(self) -> Material {
        let base = Material::default();
        match self {
            MaterialId::Brick => Material {
                texture: Some(TextureKind::Brick),
                roughness: 0.3,
                metalness: 0.1,
                ..base
            },
            MaterialId::Ground => Material {
                texture: Some(TextureKind::Grass),
                roughness: 0.8,
                metalness: 0.0,
                ..base
            },
            MaterialId::Question => Material {
                color: srgb_hex(0xFBD000),
                roughness: 0.2,
                metalness: 0.6,
                emissive: scaled(srgb_hex(0xFBD000), 0.2),
                ..base
            },
            MaterialId::UsedBlock => Material {
                color: srgb_hex(0x9C6B30),
                roughness: 0.7,
                metalness: 0.0,
                ..base
            },
            MaterialId::Pipe => Material {
                color: srgb_hex(0x00AA00),
                roughness: 0.2,
                metalness: 0.4,
                ..base
            },
            MaterialId::Wall => Material {
                color: srgb_hex(0x8B4513),
                ..base
            },
            MaterialId::MarioRed => Material {
                color: srgb_hex(0xFF0000),
                roughness: 0.6,
                metalness: 0.1,
                ..base
            },
            MaterialId::MarioBlue => Material {
                color: srgb_hex(0x0000FF),
                roughness: 0.7,
                metalness: 0.1,
                ..base
            },
            MaterialId::Skin => Material {
                color: srgb_hex(0xFFCCAA),
                roughness: 0.3,
                metalness: 0.0,
                ..base
            },
            MaterialId::Boot => Material {
                color: srgb_hex(0x8B4513),
                roughness: 0.4,
                metalness: 0.0,
                ..base
            },
            MaterialId::Black => Material {
                color: srgb_hex(0x000000),
                roughness: 0.2,
                metalness: 0.0,
                ..base
            },
            MaterialId::White => Material {
                color: srgb_hex(0xFFFFFF),
                roughness: 0.2,
                metalness: 0.0,
                ..base
            },
            MaterialId::Coin => Material {
                color: srgb_hex(0xFFD700),
                roughness: 0.1,
                metalness: 1.0,
                emissive: scaled(srgb_hex(0xFFD700), 0.4),
                ..base
            },
            MaterialId::Cloud => Material {
                color: srgb_hex(0xFFFFFF),
                roughness: 0.9,
                metalness: 0.0,
                emissive: srgb_hex(0x333333),
                ..base
            },
        }
    }
}

fn scaled(color: [f32; 3], factor: f32) -> [f32; 3] {
    color.map(|c| c * factor)
}

/// Standard-material parameters, colours in linear space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: [f32; 3],
    pub texture: Option<TextureKind>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            roughness: 1.0,
            metalness: 0.0,
            emissive: [0.0, 0.0, 0.0],
            texture: None,
        }
    }
}

impl Material {
    /// How strongly screen-space reflections show on this surface.
    pub fn reflectivity(&self) -> f32 {
        let f0 = 0.04 + 0.96 * self.metalness;
        (f0 * (1.0 - self.roughness)).clamp(0.0, 1.0)
    }
}
