//! Wireframe motor model and perspective orbit camera
//!
//! The scene is built once in model space and projected into the shared
//! 512x512 logical canvas every frame. The y axis is the shaft.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::model::MotorModel;
use crate::render::{Point, Rgb, Stroke, Surface, LOGICAL_SIZE, PHASE_COLORS};

const STATOR_OUTER: f64 = 1.0;
const STATOR_INNER: f64 = 0.72;
const STATOR_HEIGHT: f64 = 0.7;
const ROTOR_RADIUS: f64 = 0.62;
const ROTOR_HEIGHT: f64 = 0.58;
const SHAFT_LENGTH: f64 = 1.6;
const AIR_GAP: f64 = 0.08;
const TOOTH_COUNT: usize = 6;
const COIL_RADIUS: f64 = 0.68;
const COIL_SIZE: f64 = 0.12;
const COIL_ANGLES_DEG: [f64; 3] = [0.0, 120.0, 240.0];
const FIELD_ARROW_LIFT: f64 = 0.12;
const FIELD_ARROW_LENGTH: f64 = ROTOR_RADIUS * 0.65;
const STRIPE_RADIUS: f64 = ROTOR_RADIUS * 0.82;
const RING_SEGMENTS: usize = 48;

const STATOR_COLOR: Rgb = Rgb(0x94, 0xa3, 0xb8);
const TOOTH_COLOR: Rgb = Rgb(0x64, 0x74, 0x8b);
const COIL_COLORS: [Rgb; 3] = [Rgb(0xea, 0xb3, 0x08), Rgb(0xef, 0x44, 0x44), Rgb(0x22, 0xc5, 0x5e)];
const NORTH_COLOR: Rgb = Rgb(0x3b, 0x82, 0xf6);
const SOUTH_COLOR: Rgb = Rgb(0xdc, 0x26, 0x26);

const CAMERA_START: Vec3 = Vec3::new(1.6, 1.4, 2.0);
const FOV_DEG: f64 = 38.0;
const MIN_DISTANCE: f64 = 1.8;
const MAX_DISTANCE: f64 = 5.0;
const MAX_ELEVATION: f64 = FRAC_PI_2 - 0.05;
const NEAR_PLANE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    pub fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    pub fn scale(self, k: f64) -> Vec3 {
        Vec3::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn dot(self, o: Vec3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            self.scale(1.0 / len)
        } else {
            self
        }
    }

    /// Right-handed rotation about the y axis
    pub fn rotate_y(self, angle: f64) -> Vec3 {
        let (s, c) = angle.sin_cos();
        Vec3::new(self.x * c + self.z * s, self.y, -self.x * s + self.z * c)
    }
}

/// Perspective camera orbiting the origin; panning is not supported
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    /// Rotation about the shaft axis (radians)
    pub azimuth: f64,
    /// Angle above the equatorial plane (radians)
    pub elevation: f64,
    pub distance: f64,
    pub fov_deg: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_from(CAMERA_START)
    }
}

impl OrbitCamera {
    /// Camera placed at `position`, aimed at the origin
    pub fn looking_from(position: Vec3) -> Self {
        let distance = position.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let ground = position.x.hypot(position.z);
        Self {
            azimuth: position.x.atan2(position.z),
            elevation: position.y.atan2(ground).clamp(-MAX_ELEVATION, MAX_ELEVATION),
            distance,
            fov_deg: FOV_DEG,
        }
    }

    pub fn position(&self) -> Vec3 {
        let ground = self.distance * self.elevation.cos();
        Vec3::new(
            ground * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            ground * self.azimuth.cos(),
        )
    }

    /// Rotate around the model
    pub fn orbit(&mut self, d_azimuth: f64, d_elevation: f64) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(TAU);
        self.elevation = (self.elevation + d_elevation).clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    /// Scale the orbit distance; `factor < 1` moves closer
    pub fn zoom(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Project a world point into the logical canvas; `None` behind the camera
    pub fn project(&self, p: Vec3) -> Option<Point> {
        let eye = self.position();
        let forward = eye.scale(-1.0).normalized();
        let right = forward.cross(Vec3::new(0.0, 1.0, 0.0)).normalized();
        let up = right.cross(forward);

        let rel = p.sub(eye);
        let depth = rel.dot(forward);
        if depth < NEAR_PLANE {
            return None;
        }
        let focal = 1.0 / (self.fov_deg.to_radians() / 2.0).tan();
        let half = LOGICAL_SIZE / 2.0;
        Some(Point::new(
            half + rel.dot(right) * focal / depth * half,
            half - rel.dot(up) * focal / depth * half,
        ))
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge(Vec3, Vec3);

fn ring(center: Vec3, u: Vec3, v: Vec3, radius: f64, from: f64, to: f64, segments: usize) -> Vec<Edge> {
    let at = |t: f64| center.add(u.scale(radius * t.cos())).add(v.scale(radius * t.sin()));
    (0..segments)
        .map(|i| {
            let a = from + (to - from) * i as f64 / segments as f64;
            let b = from + (to - from) * (i + 1) as f64 / segments as f64;
            Edge(at(a), at(b))
        })
        .collect()
}

/// Horizontal circle (or arc) around the shaft at height `y`
fn level_ring(y: f64, radius: f64, from: f64, to: f64) -> Vec<Edge> {
    let segments = ((RING_SEGMENTS as f64) * (to - from).abs() / TAU).ceil().max(1.0) as usize;
    ring(
        Vec3::new(0.0, y, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        radius,
        from,
        to,
        segments,
    )
}

fn radial(angle: f64, radius: f64, y: f64) -> Vec3 {
    Vec3::new(radius * angle.cos(), y, radius * angle.sin())
}

/// Precomputed motor geometry
#[derive(Debug, Clone)]
pub struct MotorScene {
    stator: Vec<Edge>,
    teeth: Vec<Edge>,
    coils: [Vec<Edge>; 3],
    shaft: Edge,
    /// Rotor edges in rotor space, north half on +x
    north: Vec<Edge>,
    south: Vec<Edge>,
    stripe: Edge,
    field_arrow: Vec<Edge>,
}

impl Default for MotorScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorScene {
    pub fn new() -> Self {
        let top = STATOR_HEIGHT / 2.0;
        let mut stator = Vec::new();
        for y in [-top, top] {
            stator.extend(level_ring(y, STATOR_OUTER, 0.0, TAU));
            stator.extend(level_ring(y, STATOR_INNER, 0.0, TAU));
        }
        for i in 0..4 {
            let a = i as f64 * FRAC_PI_2;
            stator.push(Edge(radial(a, STATOR_OUTER, -top), radial(a, STATOR_OUTER, top)));
        }

        let tooth_tip = ROTOR_RADIUS + AIR_GAP / 2.0;
        let tooth_top = top - 0.03;
        let mut teeth = Vec::new();
        for i in 0..TOOTH_COUNT {
            let a = i as f64 * TAU / TOOTH_COUNT as f64;
            for y in [-tooth_top, tooth_top] {
                teeth.push(Edge(radial(a, STATOR_INNER, y), radial(a, tooth_tip, y)));
            }
            teeth.push(Edge(radial(a, tooth_tip, -tooth_top), radial(a, tooth_tip, tooth_top)));
        }

        // Each coil is wound around a tooth, so its axis points radially
        let coils = COIL_ANGLES_DEG.map(|deg: f64| {
            let a = deg.to_radians();
            let tangent = Vec3::new(-a.sin(), 0.0, a.cos());
            ring(
                radial(a, COIL_RADIUS, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                tangent,
                COIL_SIZE,
                0.0,
                TAU,
                16,
            )
        });

        let half = ROTOR_HEIGHT / 2.0;
        let pole = |from: f64, to: f64| {
            let mut edges = level_ring(-half, ROTOR_RADIUS, from, to);
            edges.extend(level_ring(half, ROTOR_RADIUS, from, to));
            let mid = (from + to) / 2.0;
            edges.push(Edge(radial(mid, ROTOR_RADIUS, -half), radial(mid, ROTOR_RADIUS, half)));
            edges
        };
        let mut north = pole(-FRAC_PI_2, FRAC_PI_2);
        let mut south = pole(FRAC_PI_2, 3.0 * FRAC_PI_2);
        // Pole boundaries belong to both halves' outlines; give them to north
        for a in [-FRAC_PI_2, FRAC_PI_2] {
            north.push(Edge(radial(a, ROTOR_RADIUS, -half), radial(a, ROTOR_RADIUS, half)));
        }
        south.push(Edge(radial(PI, 0.0, half), radial(PI, ROTOR_RADIUS, half)));

        let arrow_y = half + FIELD_ARROW_LIFT;
        let tip = Vec3::new(FIELD_ARROW_LENGTH, arrow_y, 0.0);
        let head = FIELD_ARROW_LENGTH * 0.25;
        let field_arrow = vec![
            Edge(Vec3::new(0.0, arrow_y, 0.0), tip),
            Edge(tip, Vec3::new(FIELD_ARROW_LENGTH - head, arrow_y, head * 0.6)),
            Edge(tip, Vec3::new(FIELD_ARROW_LENGTH - head, arrow_y, -head * 0.6)),
        ];

        Self {
            stator,
            teeth,
            coils,
            shaft: Edge(
                Vec3::new(0.0, -SHAFT_LENGTH / 2.0, 0.0),
                Vec3::new(0.0, SHAFT_LENGTH / 2.0, 0.0),
            ),
            north,
            south,
            stripe: Edge(
                Vec3::new(STRIPE_RADIUS, half + 0.005, 0.0),
                Vec3::new(ROTOR_RADIUS, half + 0.005, 0.0),
            ),
            field_arrow,
        }
    }

    /// Repaint the whole scene for the current model pose
    pub fn render(&self, model: &MotorModel, camera: &OrbitCamera, surface: &mut dyn Surface) {
        surface.clear();
        let mut draw = |edges: &[Edge], stroke: &Stroke, rotation: f64| {
            for edge in edges {
                let a = camera.project(edge.0.rotate_y(rotation));
                let b = camera.project(edge.1.rotate_y(rotation));
                if let (Some(a), Some(b)) = (a, b) {
                    surface.line(a, b, stroke);
                }
            }
        };

        draw(&self.stator, &Stroke::solid(STATOR_COLOR, 1.0).alpha(0.6), 0.0);
        draw(&self.teeth, &Stroke::solid(TOOTH_COLOR, 1.0), 0.0);
        draw(&[self.shaft], &Stroke::solid(STATOR_COLOR, 2.0), 0.0);

        for ((coil, color), intensity) in self.coils.iter().zip(COIL_COLORS).zip(model.coil_intensity) {
            draw(coil, &Stroke::solid(color, 2.0).alpha(glow_alpha(intensity)), 0.0);
        }

        let spin = model.rotor_angle;
        draw(&self.north, &Stroke::solid(NORTH_COLOR, 2.0), spin);
        draw(&self.south, &Stroke::solid(SOUTH_COLOR, 2.0), spin);
        draw(&[self.stripe], &Stroke::solid(Rgb::WHITE, 2.0), spin);
        draw(&self.field_arrow, &Stroke::solid(PHASE_COLORS[0], 2.0), spin);
    }
}

/// Map an emissive intensity onto stroke opacity
fn glow_alpha(intensity: f64) -> f64 {
    (0.25 + intensity / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::IDLE_GLOW;
    use crate::render::DisplayList;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_default_camera_matches_start_position() {
        let camera = OrbitCamera::default();
        let p = camera.position();
        assert!((p.x - 1.6).abs() < 1e-9);
        assert!((p.y - 1.4).abs() < 1e-9);
        assert!((p.z - 2.0).abs() < 1e-9);
        assert_eq!(camera.fov_deg, 38.0);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = OrbitCamera::default();
        let c = camera.project(Vec3::default()).unwrap();
        assert!((c.x - 256.0).abs() < 1e-6);
        assert!((c.y - 256.0).abs() < 1e-6);

        // up the shaft is up on screen
        let top = camera.project(Vec3::new(0.0, 0.5, 0.0)).unwrap();
        assert!(top.y < c.y);
    }

    #[test]
    fn test_points_behind_camera_are_culled() {
        let camera = OrbitCamera::default();
        let behind = camera.position().scale(2.0);
        assert!(camera.project(behind).is_none());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = OrbitCamera::default();
        camera.zoom(0.01);
        assert!((camera.distance - MIN_DISTANCE).abs() < EPS);
        camera.zoom(100.0);
        assert!((camera.distance - MAX_DISTANCE).abs() < EPS);
        camera.zoom(f64::NAN);
        assert!((camera.distance - MAX_DISTANCE).abs() < EPS);
    }

    #[test]
    fn test_orbit_keeps_distance_and_limits_elevation() {
        let mut camera = OrbitCamera::default();
        let d = camera.position().length();
        camera.orbit(1.0, 10.0);
        assert!((camera.position().length() - d).abs() < 1e-9);
        assert!(camera.elevation <= MAX_ELEVATION);
        camera.reset();
        assert_eq!(camera, OrbitCamera::default());
    }

    #[test]
    fn test_rotate_y_quarter_turn() {
        let v = Vec3::new(1.0, 0.0, 0.0).rotate_y(FRAC_PI_2);
        assert!(v.x.abs() < EPS);
        assert!((v.z + 1.0).abs() < EPS);
    }

    #[test]
    fn test_coil_glow_follows_intensity() {
        let scene = MotorScene::new();
        let camera = OrbitCamera::default();
        let mut model = MotorModel::default();
        model.coil_intensity = [IDLE_GLOW, 2.0, IDLE_GLOW];
        let mut list = DisplayList::new();
        scene.render(&model, &camera, &mut list);

        let alpha_of = |color: Rgb| {
            list.primitives()
                .iter()
                .find(|p| p.stroke.color == color)
                .map(|p| p.stroke.alpha)
                .unwrap()
        };
        assert!((alpha_of(COIL_COLORS[1]) - 1.0).abs() < EPS);
        assert!(alpha_of(COIL_COLORS[0]) < 0.5);
    }

    #[test]
    fn test_rotor_turns_with_model() {
        let scene = MotorScene::new();
        let camera = OrbitCamera::default();
        let stripe_at = |angle: f64| {
            let model = MotorModel {
                rotor_angle: angle,
                ..Default::default()
            };
            let mut list = DisplayList::new();
            scene.render(&model, &camera, &mut list);
            list.primitives()
                .iter()
                .find(|p| p.stroke.color == Rgb::WHITE)
                .map(|p| p.to)
                .unwrap()
        };
        let a = stripe_at(0.0);
        let b = stripe_at(PI);
        assert!(a.distance(b) > 10.0);
    }
}
