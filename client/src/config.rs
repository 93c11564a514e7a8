use glam::Vec3;

// Player dimensions and physics
pub const PLAYER_SIZE: Vec3 = Vec3::new(0.8, 1.8, 0.8);
pub const MOVE_SPEED: f32 = 10.0;
pub const ACCELERATION: f32 = 60.0;
pub const FRICTION: f32 = 45.0;
pub const JUMP_VELOCITY: f32 = 15.0;
pub const GRAVITY: f32 = 30.0;
pub const JUMP_LIFT: f32 = 0.1; // breaks ground contact on takeoff

// Respawn
pub const DEFAULT_SPAWN: Vec3 = Vec3::new(0.0, 5.0, 0.0);
pub const KILL_PLANE_Y: f32 = -10.0;

// Camera
pub const CAMERA_FOV_DEGREES: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_HEIGHT: f32 = 8.0;
pub const CAMERA_BACK: f32 = 12.0;
pub const CAMERA_SMOOTHING: f32 = 0.1; // fraction of the gap closed per 60 Hz frame
pub const CAMERA_MIN_ELEVATION: f32 = 0.1;
pub const CAMERA_MAX_ELEVATION: f32 = 1.3;
pub const MOUSE_SENSITIVITY: f32 = 0.003;

// Level
pub const BLOCK_SIZE: f32 = 2.0;
pub const GROUND_EXTENT: f32 = 100.0;
pub const GROUND_THICKNESS: f32 = 1.0;
pub const MAZE_ROWS: usize = 15;
pub const MAZE_COLS: usize = 15;
pub const MAZE_CELL_SIZE: f32 = 4.0;
pub const MAZE_WALL_HEIGHT: f32 = 4.0;
pub const MAZE_WALL_THICKNESS: f32 = 0.5;
pub const COIN_RADIUS: f32 = 0.5;
pub const COIN_SPIN_SPEED: f32 = 3.0;
pub const COIN_POP_DURATION: f32 = 0.5;
pub const COIN_POP_HEIGHT: f32 = 2.5;
pub const CLOUD_DRIFT_SPEED: f32 = 1.5;

// Lighting
pub const SKY_COLOR: u32 = 0x87CEEB;
pub const AMBIENT_INTENSITY: f32 = 0.4;
pub const SUN_INTENSITY: f32 = 1.5;
pub const SUN_POSITION: Vec3 = Vec3::new(100.0, 200.0, 100.0);
pub const SHADOW_MAP_SIZE: u32 = 4096;
pub const SHADOW_EXTENT: f32 = 100.0;
pub const SHADOW_NEAR: f32 = 0.5;
pub const SHADOW_FAR: f32 = 500.0;
pub const SHADOW_BIAS: f32 = -0.0005;
pub const FOG_NEAR: f32 = 20.0;
pub const FOG_FAR: f32 = 150.0;

// Post-processing
pub const SSAO_KERNEL_SIZE: usize = 16;
pub const SSAO_KERNEL_RADIUS: f32 = 1.5;
pub const SSAO_MIN_DISTANCE: f32 = 0.005;
pub const SSAO_MAX_DISTANCE: f32 = 0.1;
pub const SSR_MAX_DISTANCE: f32 = 8.0;
pub const SSR_THICKNESS: f32 = 0.018;
pub const BLOOM_THRESHOLD: f32 = 0.5;
pub const BLOOM_STRENGTH: f32 = 0.4;
pub const BLOOM_RADIUS: f32 = 0.5;

// Frame
pub const MAX_FRAME_DT: f32 = 0.1;
