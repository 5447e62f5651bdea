//! Rigid-body world and sphere sweeps
//!
//! Boxes are axis-aligned; a body's rotation does not affect its collider.

use std::collections::BTreeMap;
use std::sync::Mutex;

use contracts::{
    Centimeters, EngineHandle, HitResult, Location, Mobility, ShapeConfig, SweepFilter,
    SweepRequest, Transform, Vector3, WorldQuery,
};
use tracing::trace;

const EPSILON: f64 = 1e-9;

/// Collision shape, centimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Sphere { radius: f64 },
    Box { half_extents: Vector3 },
}

impl From<ShapeConfig> for Collider {
    fn from(shape: ShapeConfig) -> Self {
        match shape {
            ShapeConfig::Sphere { radius } => Self::Sphere { radius },
            ShapeConfig::Box { half_extents } => Self::Box { half_extents },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub handle: EngineHandle,
    pub transform: Transform,
    pub collider: Collider,
    pub mobility: Mobility,
    /// cm/s, applied by [`World::step`] to dynamic bodies only
    pub velocity: Vector3,
}

impl Body {
    fn center(&self) -> Vector3 {
        self.transform.location.as_vector()
    }
}

/// Sweep recorded for debug drawing
#[derive(Debug, Clone, PartialEq)]
pub struct DebugTrace {
    pub tag: String,
    pub start: Location,
    pub end: Location,
    pub radius: Centimeters,
    pub hit: Option<Location>,
}

/// Overlap between a body and another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub other: EngineHandle,
    /// Unit normal pointing from the queried body toward `other`
    pub normal: Vector3,
}

#[derive(Debug, Default)]
pub struct World {
    bodies: BTreeMap<EngineHandle, Body>,
    next_handle: u64,
    traces: Mutex<Vec<DebugTrace>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh engine handle for an object without a collider (e.g. a sensor)
    pub fn allocate_handle(&mut self) -> EngineHandle {
        self.next_handle += 1;
        EngineHandle(self.next_handle)
    }

    pub fn spawn(
        &mut self,
        transform: Transform,
        collider: Collider,
        mobility: Mobility,
        velocity: Vector3,
    ) -> EngineHandle {
        let handle = self.allocate_handle();
        self.bodies.insert(
            handle,
            Body {
                handle,
                transform,
                collider,
                mobility,
                velocity,
            },
        );
        trace!(handle = %handle, ?collider, ?mobility, "body spawned");
        handle
    }

    pub fn despawn(&mut self, handle: EngineHandle) -> Option<Body> {
        self.bodies.remove(&handle)
    }

    pub fn body(&self, handle: EngineHandle) -> Option<&Body> {
        self.bodies.get(&handle)
    }

    pub fn pose(&self, handle: EngineHandle) -> Option<Transform> {
        self.bodies.get(&handle).map(|b| b.transform)
    }

    pub fn velocity(&self, handle: EngineHandle) -> Vector3 {
        self.bodies
            .get(&handle)
            .map_or(Vector3::ZERO, |b| b.velocity)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Integrate dynamic bodies over `delta_seconds`
    pub fn step(&mut self, delta_seconds: f64) {
        for body in self.bodies.values_mut() {
            if body.mobility == Mobility::Dynamic {
                body.transform.location = body.transform.location + body.velocity * delta_seconds;
            }
        }
    }

    /// Bodies currently overlapping `handle`
    pub fn contacts(&self, handle: EngineHandle) -> Vec<Contact> {
        let Some(body) = self.bodies.get(&handle) else {
            return Vec::new();
        };
        self.bodies
            .values()
            .filter(|other| other.handle != handle)
            .filter_map(|other| {
                overlap(body, other).map(|normal| Contact {
                    other: other.handle,
                    normal,
                })
            })
            .collect()
    }

    /// Drain recorded debug sweeps
    pub fn take_debug_traces(&self) -> Vec<DebugTrace> {
        std::mem::take(&mut *self.traces.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl WorldQuery for World {
    fn sweep_single(&self, request: &SweepRequest) -> Option<HitResult> {
        let start = request.start.as_vector();
        let delta = request.end.as_vector() - start;
        let length = delta.length();
        let dir = delta.normalized();
        let radius = request.radius.value().max(0.0);

        let hit = self
            .bodies
            .values()
            .filter(|body| passes_filter(body.mobility, request.filter))
            .filter(|body| !request.is_ignored(body.handle))
            .filter_map(|body| {
                let (t, normal, location) = match body.collider {
                    Collider::Sphere { radius: r } => {
                        sweep_sphere(body.center(), r, start, dir, length, radius)?
                    }
                    Collider::Box { half_extents } => {
                        sweep_box(body.center(), half_extents, start, dir, length, radius)?
                    }
                };
                Some(HitResult {
                    handle: Some(body.handle),
                    distance: Centimeters(t),
                    location,
                    normal,
                })
            })
            .min_by(|a, b| a.distance.value().total_cmp(&b.distance.value()));

        if let Some(tag) = &request.debug_tag {
            self.traces
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(DebugTrace {
                    tag: tag.clone(),
                    start: request.start,
                    end: request.end,
                    radius: request.radius,
                    hit: hit.map(|h| h.location),
                });
        }
        hit
    }
}

fn passes_filter(mobility: Mobility, filter: SweepFilter) -> bool {
    match filter {
        SweepFilter::AllDynamicObjects => mobility == Mobility::Dynamic,
        SweepFilter::WorldStatic => mobility == Mobility::Static,
    }
}

/// Sphere of `sweep_radius` against a sphere: ray vs inflated sphere
fn sweep_sphere(
    center: Vector3,
    body_radius: f64,
    start: Vector3,
    dir: Vector3,
    length: f64,
    sweep_radius: f64,
) -> Option<(f64, Vector3, Location)> {
    let inflated = body_radius + sweep_radius;
    let m = start - center;
    let c = m.dot(m) - inflated * inflated;

    let t = if c <= 0.0 {
        0.0
    } else {
        if length <= EPSILON {
            return None;
        }
        let b = m.dot(dir);
        if b > 0.0 {
            return None;
        }
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let t = -b - discriminant.sqrt();
        if t > length {
            return None;
        }
        t.max(0.0)
    };

    let sweep_center = start + dir * t;
    let mut normal = (sweep_center - center).normalized();
    if normal == Vector3::ZERO {
        normal = -dir;
    }
    Some((t, normal, Location::from(center + normal * body_radius)))
}

/// Sphere of `sweep_radius` against an AABB
///
/// The swept volume around the box is the box grown by the radius with
/// rounded edges and corners: three face slabs, twelve edge cylinders and
/// eight corner spheres. The first entry into any of them is the hit.
fn sweep_box(
    center: Vector3,
    half_extents: Vector3,
    start: Vector3,
    dir: Vector3,
    length: f64,
    sweep_radius: f64,
) -> Option<(f64, Vector3, Location)> {
    let lo = center - half_extents;
    let hi = center + half_extents;

    let t = if (start - closest_on_box(start, lo, hi)).length() <= sweep_radius {
        0.0
    } else {
        if length <= EPSILON {
            return None;
        }
        rounded_box_entry(lo, hi, start, dir, sweep_radius)?
    };
    if t > length {
        return None;
    }

    let sweep_center = start + dir * t;
    let closest = closest_on_box(sweep_center, lo, hi);
    let mut normal = (sweep_center - closest).normalized();
    if normal == Vector3::ZERO {
        normal = -dir;
    }
    Some((t, normal, Location::from(closest)))
}

/// Earliest `t >= 0` at which the ray comes within `radius` of the box
fn rounded_box_entry(
    lo: Vector3,
    hi: Vector3,
    start: Vector3,
    dir: Vector3,
    radius: f64,
) -> Option<f64> {
    let mut best: Option<f64> = None;
    let mut keep = |t: Option<f64>| {
        if let Some(t) = t {
            if best.map_or(true, |b| t < b) {
                best = Some(t);
            }
        }
    };

    for axis in 0..3 {
        let grow = unit(axis) * radius;
        keep(ray_aabb_entry(lo - grow, hi + grow, start, dir));
    }

    for corner in 0..8 {
        let point = Vector3::new(
            bound(lo, hi, 0, corner & 1 != 0),
            bound(lo, hi, 1, corner & 2 != 0),
            bound(lo, hi, 2, corner & 4 != 0),
        );
        keep(ray_sphere_entry(point, radius, start, dir));
    }

    for axis in 0..3 {
        let (i, j) = ((axis + 1) % 3, (axis + 2) % 3);
        for edge in 0..4 {
            let ci = bound(lo, hi, i, edge & 1 != 0);
            let cj = bound(lo, hi, j, edge & 2 != 0);
            let (min, max) = (component(lo, axis), component(hi, axis));
            keep(
                ray_cylinder_entry((i, ci), (j, cj), radius, start, dir).filter(|&t| {
                    let along = component(start + dir * t, axis);
                    along >= min && along <= max
                }),
            );
        }
    }

    best
}

/// Slab test; entry distance along `dir`, clamped at zero
fn ray_aabb_entry(lo: Vector3, hi: Vector3, start: Vector3, dir: Vector3) -> Option<f64> {
    let mut t_enter = 0.0_f64;
    let mut t_exit = f64::INFINITY;

    for axis in 0..3 {
        let o = component(start, axis);
        let d = component(dir, axis);
        let (min, max) = (component(lo, axis), component(hi, axis));

        if d.abs() < EPSILON {
            if o < min || o > max {
                return None;
            }
            continue;
        }

        let (t0, t1) = ((min - o) / d, (max - o) / d);
        t_enter = t_enter.max(t0.min(t1));
        t_exit = t_exit.min(t0.max(t1));
        if t_enter > t_exit {
            return None;
        }
    }
    Some(t_enter)
}

fn ray_sphere_entry(center: Vector3, radius: f64, start: Vector3, dir: Vector3) -> Option<f64> {
    let m = start - center;
    let b = m.dot(dir);
    let c = m.dot(m) - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}

/// Entry into the lateral surface of an infinite cylinder whose axis is
/// parallel to a coordinate axis and passes through `i = ci`, `j = cj`.
/// Starts inside the cylinder are left to the caps (corner spheres).
fn ray_cylinder_entry(
    (i, ci): (usize, f64),
    (j, cj): (usize, f64),
    radius: f64,
    start: Vector3,
    dir: Vector3,
) -> Option<f64> {
    let (oi, oj) = (component(start, i) - ci, component(start, j) - cj);
    let (di, dj) = (component(dir, i), component(dir, j));

    let a = di * di + dj * dj;
    if a < EPSILON {
        return None;
    }
    let b = oi * di + oj * dj;
    let c = oi * oi + oj * oj - radius * radius;
    if c <= 0.0 {
        return None;
    }
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / a;
    (t >= 0.0).then_some(t)
}

fn closest_on_box(point: Vector3, lo: Vector3, hi: Vector3) -> Vector3 {
    Vector3::new(
        point.x.clamp(lo.x, hi.x),
        point.y.clamp(lo.y, hi.y),
        point.z.clamp(lo.z, hi.z),
    )
}

/// Overlap normal from `a` toward `b`, if the colliders intersect
fn overlap(a: &Body, b: &Body) -> Option<Vector3> {
    let (ca, cb) = (a.center(), b.center());
    match (a.collider, b.collider) {
        (Collider::Sphere { radius: ra }, Collider::Sphere { radius: rb }) => {
            let d = cb - ca;
            (d.length() < ra + rb).then(|| d.normalized())
        }
        (Collider::Sphere { radius }, Collider::Box { half_extents }) => {
            sphere_box_overlap(ca, radius, cb, half_extents)
        }
        (Collider::Box { half_extents }, Collider::Sphere { radius }) => {
            sphere_box_overlap(cb, radius, ca, half_extents).map(|n| -n)
        }
        (Collider::Box { half_extents: ha }, Collider::Box { half_extents: hb }) => {
            let d = cb - ca;
            let mut best: Option<(f64, Vector3)> = None;
            for axis in 0..3 {
                let penetration = component(ha, axis) + component(hb, axis)
                    - component(d, axis).abs();
                if penetration <= 0.0 {
                    return None;
                }
                if best.map_or(true, |(p, _)| penetration < p) {
                    let sign = if component(d, axis) < 0.0 { -1.0 } else { 1.0 };
                    best = Some((penetration, unit(axis) * sign));
                }
            }
            best.map(|(_, n)| n)
        }
    }
}

/// Normal from the sphere toward the box
fn sphere_box_overlap(
    sphere_center: Vector3,
    radius: f64,
    box_center: Vector3,
    half_extents: Vector3,
) -> Option<Vector3> {
    let closest = closest_on_box(
        sphere_center,
        box_center - half_extents,
        box_center + half_extents,
    );
    let d = closest - sphere_center;
    if d.length() >= radius {
        return None;
    }
    let n = d.normalized();
    // Center inside the box
    Some(if n == Vector3::ZERO {
        (box_center - sphere_center).normalized()
    } else {
        n
    })
}

fn component(v: Vector3, axis: usize) -> f64 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

fn bound(lo: Vector3, hi: Vector3, axis: usize, high: bool) -> f64 {
    if high {
        component(hi, axis)
    } else {
        component(lo, axis)
    }
}

fn unit(axis: usize) -> Vector3 {
    match axis {
        0 => Vector3::new(1.0, 0.0, 0.0),
        1 => Vector3::new(0.0, 1.0, 0.0),
        _ => Vector3::new(0.0, 0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64, z: f64) -> Transform {
        Transform {
            location: Location::new(x, y, z),
            ..Default::default()
        }
    }

    fn sweep(length: f64, radius: f64, filter: SweepFilter) -> SweepRequest {
        SweepRequest {
            start: Location::new(0.0, 0.0, 0.0),
            end: Location::new(length, 0.0, 0.0),
            radius: Centimeters(radius),
            filter,
            ignored: Vec::new(),
            debug_tag: None,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_sweep_hits_sphere() {
        let mut world = World::new();
        let handle = world.spawn(
            at(250.0, 0.0, 0.0),
            Collider::Sphere { radius: 20.0 },
            Mobility::Static,
            Vector3::ZERO,
        );

        let hit = world
            .sweep_single(&sweep(500.0, 10.0, SweepFilter::WorldStatic))
            .unwrap();
        assert_eq!(hit.handle, Some(handle));
        assert!(approx(hit.distance.value(), 220.0));
        assert!(approx(hit.location.x, 230.0));
        assert!(approx(hit.normal.x, -1.0));
    }

    #[test]
    fn test_sweep_hits_box_face() {
        let mut world = World::new();
        world.spawn(
            at(250.0, 0.0, 0.0),
            Collider::Box {
                half_extents: Vector3::new(5.0, 50.0, 50.0),
            },
            Mobility::Static,
            Vector3::ZERO,
        );

        let hit = world
            .sweep_single(&sweep(500.0, 10.0, SweepFilter::WorldStatic))
            .unwrap();
        assert!(approx(hit.distance.value(), 235.0));
        assert!(approx(hit.location.x, 245.0));
        assert_eq!(hit.normal, Vector3::new(-1.0, 0.0, 0.0));
    }

    fn cube_at_250() -> World {
        let mut world = World::new();
        world.spawn(
            at(250.0, 0.0, 0.0),
            Collider::Box {
                half_extents: Vector3::new(5.0, 5.0, 5.0),
            },
            Mobility::Static,
            Vector3::ZERO,
        );
        world
    }

    fn sweep_from(y: f64, z: f64, radius: f64) -> SweepRequest {
        SweepRequest {
            start: Location::new(0.0, y, z),
            end: Location::new(500.0, y, z),
            ..sweep(500.0, radius, SweepFilter::WorldStatic)
        }
    }

    #[test]
    fn test_sweep_passes_box_edge_outside_radius() {
        // The box edge at y = z = 5 is ~12.7 cm from the sweep line
        let world = cube_at_250();
        assert!(world.sweep_single(&sweep_from(14.0, 14.0, 10.0)).is_none());
        assert!(world.sweep_single(&sweep_from(16.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn test_sweep_hits_box_edge() {
        let world = cube_at_250();

        let hit = world.sweep_single(&sweep_from(12.0, 0.0, 10.0)).unwrap();
        assert!(approx(hit.distance.value(), 245.0 - 51.0_f64.sqrt()));
        assert_eq!(hit.location, Location::new(245.0, 5.0, 0.0));
        assert!(approx(hit.normal.length(), 1.0));
        assert!(hit.normal.x < 0.0 && hit.normal.y > 0.0);
    }

    #[test]
    fn test_sweep_hits_box_corner() {
        let world = cube_at_250();

        let hit = world.sweep_single(&sweep_from(12.0, 12.0, 10.0)).unwrap();
        assert!(approx(hit.distance.value(), 245.0 - 2.0_f64.sqrt()));
        assert_eq!(hit.location, Location::new(245.0, 5.0, 5.0));
        let gap = Location::new(hit.distance.value(), 12.0, 12.0).distance(hit.location);
        assert!(approx(gap, 10.0));
    }

    #[test]
    fn test_sweep_returns_nearest() {
        let mut world = World::new();
        world.spawn(
            at(400.0, 0.0, 0.0),
            Collider::Sphere { radius: 10.0 },
            Mobility::Static,
            Vector3::ZERO,
        );
        let near = world.spawn(
            at(100.0, 0.0, 0.0),
            Collider::Sphere { radius: 10.0 },
            Mobility::Static,
            Vector3::ZERO,
        );

        let hit = world
            .sweep_single(&sweep(500.0, 0.0, SweepFilter::WorldStatic))
            .unwrap();
        assert_eq!(hit.handle, Some(near));
        assert!(approx(hit.distance.value(), 90.0));
    }

    #[test]
    fn test_sweep_respects_filter_and_ignored() {
        let mut world = World::new();
        let car = world.spawn(
            at(100.0, 0.0, 0.0),
            Collider::Sphere { radius: 10.0 },
            Mobility::Dynamic,
            Vector3::ZERO,
        );

        assert!(world
            .sweep_single(&sweep(500.0, 10.0, SweepFilter::WorldStatic))
            .is_none());

        let mut request = sweep(500.0, 10.0, SweepFilter::AllDynamicObjects);
        assert!(world.sweep_single(&request).is_some());
        request.ignored.push(car);
        assert!(world.sweep_single(&request).is_none());
    }

    #[test]
    fn test_sweep_misses_and_out_of_range() {
        let mut world = World::new();
        world.spawn(
            at(100.0, 80.0, 0.0),
            Collider::Sphere { radius: 20.0 },
            Mobility::Static,
            Vector3::ZERO,
        );
        world.spawn(
            at(900.0, 0.0, 0.0),
            Collider::Sphere { radius: 20.0 },
            Mobility::Static,
            Vector3::ZERO,
        );

        assert!(world
            .sweep_single(&sweep(500.0, 10.0, SweepFilter::WorldStatic))
            .is_none());
        // Widening the sweep reaches the side sphere
        assert!(world
            .sweep_single(&sweep(500.0, 70.0, SweepFilter::WorldStatic))
            .is_some());
    }

    #[test]
    fn test_start_inside_reports_zero() {
        let mut world = World::new();
        world.spawn(
            at(5.0, 0.0, 0.0),
            Collider::Box {
                half_extents: Vector3::new(20.0, 20.0, 20.0),
            },
            Mobility::Static,
            Vector3::ZERO,
        );

        let hit = world
            .sweep_single(&sweep(500.0, 1.0, SweepFilter::WorldStatic))
            .unwrap();
        assert_eq!(hit.distance, Centimeters(0.0));
    }

    #[test]
    fn test_debug_trace_recorded_when_tagged() {
        let world = World::new();
        world.sweep_single(&sweep(500.0, 10.0, SweepFilter::WorldStatic));
        assert!(world.take_debug_traces().is_empty());

        let mut request = sweep(500.0, 10.0, SweepFilter::WorldStatic);
        request.debug_tag = Some("ObstacleDebugTrace".into());
        world.sweep_single(&request);

        let traces = world.take_debug_traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].tag, "ObstacleDebugTrace");
        assert!(traces[0].hit.is_none());
        assert!(world.take_debug_traces().is_empty());
    }

    #[test]
    fn test_step_moves_dynamic_only() {
        let mut world = World::new();
        let car = world.spawn(
            at(0.0, 0.0, 0.0),
            Collider::Sphere { radius: 1.0 },
            Mobility::Dynamic,
            Vector3::new(100.0, 0.0, 0.0),
        );
        let wall = world.spawn(
            at(0.0, 0.0, 0.0),
            Collider::Sphere { radius: 1.0 },
            Mobility::Static,
            Vector3::new(100.0, 0.0, 0.0),
        );

        world.step(0.5);
        assert!(approx(world.pose(car).unwrap().location.x, 50.0));
        assert!(approx(world.pose(wall).unwrap().location.x, 0.0));
    }

    #[test]
    fn test_contacts() {
        let mut world = World::new();
        let car = world.spawn(
            at(0.0, 0.0, 0.0),
            Collider::Box {
                half_extents: Vector3::new(200.0, 90.0, 70.0),
            },
            Mobility::Dynamic,
            Vector3::ZERO,
        );
        let pole = world.spawn(
            at(210.0, 0.0, 0.0),
            Collider::Sphere { radius: 15.0 },
            Mobility::Static,
            Vector3::ZERO,
        );
        world.spawn(
            at(1000.0, 0.0, 0.0),
            Collider::Sphere { radius: 15.0 },
            Mobility::Static,
            Vector3::ZERO,
        );

        let contacts = world.contacts(car);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].other, pole);
        assert!(approx(contacts[0].normal.x, 1.0));

        let back = world.contacts(pole);
        assert!(approx(back[0].normal.x, -1.0));
    }
}
