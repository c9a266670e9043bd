//! Constructive solid geometry on indexed triangle meshes.
//!
//! Boolean operations are evaluated with binary space partitioning trees:
//! each brush is turned into convex polygons, the polygons are sorted into a
//! BSP tree keyed by their planes, and the trees clip each other. Polygons
//! that straddle a plane are split, interpolating every vertex attribute.
//!
//! ```no_run
//! use terrain_sandbox::csg::{Brush, Evaluator, Operation};
//! use terrain_sandbox::data_structures::geometry::Geometry;
//!
//! let board = Brush::new(Geometry::cuboid(11.0, 2.0, 11.0));
//! let hole = Brush::new(Geometry::cuboid(10.0, 2.1, 10.0));
//! let frame = Evaluator::default().evaluate(&board, &hole, Operation::Subtraction);
//! assert_eq!(frame.bounding_box().unwrap().max.x, 5.5);
//! ```

use cgmath::{ElementWise, InnerSpace, Vector2, Vector3};

use crate::data_structures::{geometry::Geometry, instance::Instance, model::MeshVertex};

/// Boolean operation between brush `a` and brush `b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Everything inside `a` or `b`.
    Addition,
    /// `a` with `b` carved out.
    Subtraction,
    /// `b` with `a` carved out.
    ReverseSubtraction,
    /// Only what `a` and `b` share.
    Intersection,
    /// Everything inside exactly one of the two.
    Difference,
}

/// A closed solid the evaluator can combine.
#[derive(Clone, Debug)]
pub struct Brush {
    pub geometry: Geometry,
    pub transform: Option<Instance>,
}

impl Brush {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Instance) -> Self {
        self.transform = Some(transform);
        self
    }

    fn polygons(&self) -> Vec<Polygon> {
        let matrix = self.transform.as_ref().map(Instance::to_matrix);
        let transform_vertex = |vertex: &MeshVertex| -> Vertex {
            let mut position = Vector3::from(vertex.position);
            let mut normal = Vector3::from(vertex.normal);
            if let (Some(matrix), Some(instance)) = (matrix, self.transform.as_ref()) {
                position = (matrix * position.extend(1.0)).truncate();
                // inverse scale keeps normals perpendicular under non-uniform scaling
                normal = instance.rotation * normal.div_element_wise(instance.scale);
            }
            Vertex {
                position,
                normal: normal.normalize(),
                uv: Vector2::from(vertex.tex_coords),
            }
        };

        self.geometry
            .triangles()
            .filter_map(|triangle| Polygon::new(triangle.map(&transform_vertex).to_vec()))
            .collect()
    }
}

/// Evaluates boolean operations between brushes.
#[derive(Clone, Copy, Debug)]
pub struct Evaluator {
    /// Distance below which a point counts as lying on a plane.
    pub epsilon: f32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self { epsilon: 1e-5 }
    }
}

impl Evaluator {
    /// Combines `a` and `b`. The result is a single indexed geometry with
    /// one material group.
    pub fn evaluate(&self, a: &Brush, b: &Brush, operation: Operation) -> Geometry {
        let (pa, pb) = (a.polygons(), b.polygons());
        let polygons = match operation {
            Operation::Addition => self.union(pa, pb),
            Operation::Subtraction => self.subtract(pa, pb),
            Operation::ReverseSubtraction => self.subtract(pb, pa),
            Operation::Intersection => self.intersect(pa, pb),
            Operation::Difference => {
                let mut polygons = self.subtract(pa.clone(), pb.clone());
                polygons.extend(self.subtract(pb, pa));
                polygons
            }
        };
        let geometry = to_geometry(&polygons);
        log::debug!(
            "csg {operation:?}: {} polygons, {} triangles",
            polygons.len(),
            geometry.triangle_count()
        );
        geometry
    }

    fn union(&self, a: Vec<Polygon>, b: Vec<Polygon>) -> Vec<Polygon> {
        let mut a = Node::new(a, self.epsilon);
        let mut b = Node::new(b, self.epsilon);
        a.clip_to(&b, self.epsilon);
        b.clip_to(&a, self.epsilon);
        b.invert();
        b.clip_to(&a, self.epsilon);
        b.invert();
        a.build(b.all_polygons(), self.epsilon);
        a.all_polygons()
    }

    fn subtract(&self, a: Vec<Polygon>, b: Vec<Polygon>) -> Vec<Polygon> {
        let mut a = Node::new(a, self.epsilon);
        let mut b = Node::new(b, self.epsilon);
        a.invert();
        a.clip_to(&b, self.epsilon);
        b.clip_to(&a, self.epsilon);
        b.invert();
        b.clip_to(&a, self.epsilon);
        b.invert();
        a.build(b.all_polygons(), self.epsilon);
        a.invert();
        a.all_polygons()
    }

    fn intersect(&self, a: Vec<Polygon>, b: Vec<Polygon>) -> Vec<Polygon> {
        let mut a = Node::new(a, self.epsilon);
        let mut b = Node::new(b, self.epsilon);
        a.invert();
        b.clip_to(&a, self.epsilon);
        b.invert();
        a.clip_to(&b, self.epsilon);
        b.clip_to(&a, self.epsilon);
        a.build(b.all_polygons(), self.epsilon);
        a.invert();
        a.all_polygons()
    }
}

/// Fan-triangulates the convex polygons back into an indexed mesh.
fn to_geometry(polygons: &[Polygon]) -> Geometry {
    let mut geometry = Geometry::default();
    for polygon in polygons {
        let base = geometry.vertices.len() as u32;
        geometry
            .vertices
            .extend(polygon.vertices.iter().map(|vertex| MeshVertex {
                position: vertex.position.into(),
                normal: vertex.normal.normalize().into(),
                tex_coords: vertex.uv.into(),
            }));
        for i in 1..polygon.vertices.len() as u32 - 1 {
            geometry.indices.extend_from_slice(&[base, base + i, base + i + 1]);
        }
    }
    geometry
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Vertex {
    position: Vector3<f32>,
    normal: Vector3<f32>,
    uv: Vector2<f32>,
}

impl Vertex {
    fn flip(&mut self) {
        self.normal = -self.normal;
    }

    fn lerp(&self, other: &Vertex, t: f32) -> Vertex {
        Vertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal + (other.normal - self.normal) * t,
            uv: self.uv + (other.uv - self.uv) * t,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Plane {
    normal: Vector3<f32>,
    w: f32,
}

/// Where a polygon ended up relative to a splitting plane.
#[derive(Debug, PartialEq)]
enum Split {
    CoplanarFront(Polygon),
    CoplanarBack(Polygon),
    Front(Polygon),
    Back(Polygon),
    Spanning {
        front: Option<Polygon>,
        back: Option<Polygon>,
    },
}

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

impl Plane {
    fn from_points(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Option<Self> {
        let normal = (b - a).cross(c - a);
        if normal.magnitude2() <= f32::EPSILON * f32::EPSILON {
            return None;
        }
        let normal = normal.normalize();
        Some(Self {
            normal,
            w: normal.dot(a),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify(&self, point: Vector3<f32>, epsilon: f32) -> u8 {
        let t = self.normal.dot(point) - self.w;
        if t < -epsilon {
            BACK
        } else if t > epsilon {
            FRONT
        } else {
            COPLANAR
        }
    }

    fn split(&self, polygon: Polygon, epsilon: f32) -> Split {
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|vertex| self.classify(vertex.position, epsilon))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR if self.normal.dot(polygon.plane.normal) > 0.0 => Split::CoplanarFront(polygon),
            COPLANAR => Split::CoplanarBack(polygon),
            FRONT => Split::Front(polygon),
            BACK => Split::Back(polygon),
            _ => {
                let n = polygon.vertices.len();
                let mut front = Vec::with_capacity(n + 1);
                let mut back = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                    if ti != BACK {
                        front.push(*vi);
                    }
                    if ti != FRONT {
                        back.push(*vi);
                    }
                    if ti | tj == SPANNING {
                        let t = (self.w - self.normal.dot(vi.position))
                            / self.normal.dot(vj.position - vi.position);
                        let vertex = vi.lerp(vj, t);
                        front.push(vertex);
                        back.push(vertex);
                    }
                }
                Split::Spanning {
                    front: polygon.with_vertices(front),
                    back: polygon.with_vertices(back),
                }
            }
        }
    }
}

/// A convex planar polygon.
#[derive(Clone, Debug, PartialEq)]
struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
}

impl Polygon {
    /// `None` for degenerate (zero-area) input.
    fn new(vertices: Vec<Vertex>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(
            vertices[0].position,
            vertices[1].position,
            vertices[2].position,
        )?;
        Some(Self { vertices, plane })
    }

    /// A piece of this polygon; pieces share the parent's plane.
    fn with_vertices(&self, vertices: Vec<Vertex>) -> Option<Self> {
        (vertices.len() >= 3).then(|| Self {
            vertices,
            plane: self.plane,
        })
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        self.vertices.iter_mut().for_each(Vertex::flip);
        self.plane.flip();
    }
}

#[derive(Debug, Default)]
struct Node {
    plane: Option<Plane>,
    front: Option<Box<Node>>,
    back: Option<Box<Node>>,
    polygons: Vec<Polygon>,
}

impl Node {
    fn new(polygons: Vec<Polygon>, epsilon: f32) -> Self {
        let mut node = Self::default();
        node.build(polygons, epsilon);
        node
    }

    /// Turns solid space into empty space and vice versa.
    fn invert(&mut self) {
        self.polygons.iter_mut().for_each(Polygon::flip);
        if let Some(plane) = self.plane.as_mut() {
            plane.flip();
        }
        if let Some(front) = self.front.as_mut() {
            front.invert();
        }
        if let Some(back) = self.back.as_mut() {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Removes the parts of `polygons` that lie inside this tree's solid.
    fn clip_polygons(&self, polygons: Vec<Polygon>, epsilon: f32) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            match plane.split(polygon, epsilon) {
                Split::CoplanarFront(p) | Split::Front(p) => front.push(p),
                Split::CoplanarBack(p) | Split::Back(p) => back.push(p),
                Split::Spanning { front: f, back: b } => {
                    front.extend(f);
                    back.extend(b);
                }
            }
        }
        let mut front = match &self.front {
            Some(node) => node.clip_polygons(front, epsilon),
            None => front,
        };
        // nothing behind a leaf survives: that is the inside of the solid
        let back = match &self.back {
            Some(node) => node.clip_polygons(back, epsilon),
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    /// Removes everything in this tree that lies inside `other`.
    fn clip_to(&mut self, other: &Node, epsilon: f32) {
        self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons), epsilon);
        if let Some(front) = self.front.as_mut() {
            front.clip_to(other, epsilon);
        }
        if let Some(back) = self.back.as_mut() {
            back.clip_to(other, epsilon);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut polygons = self.polygons.clone();
        if let Some(front) = &self.front {
            polygons.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            polygons.extend(back.all_polygons());
        }
        polygons
    }

    fn build(&mut self, polygons: Vec<Polygon>, epsilon: f32) {
        let Some(first) = polygons.first() else {
            return;
        };
        let plane = *self.plane.get_or_insert(first.plane);
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            match plane.split(polygon, epsilon) {
                Split::CoplanarFront(p) | Split::CoplanarBack(p) => self.polygons.push(p),
                Split::Front(p) => front.push(p),
                Split::Back(p) => back.push(p),
                Split::Spanning { front: f, back: b } => {
                    front.extend(f);
                    back.extend(b);
                }
            }
        }
        if !front.is_empty() {
            self.front
                .get_or_insert_with(Default::default)
                .build(front, epsilon);
        }
        if !back.is_empty() {
            self.back
                .get_or_insert_with(Default::default)
                .build(back, epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Zero;

    use super::*;

    fn vertex(x: f32, y: f32, z: f32) -> Vertex {
        Vertex {
            position: Vector3::new(x, y, z),
            normal: Vector3::unit_z(),
            uv: Vector2::zero(),
        }
    }

    fn square(z: f32) -> Polygon {
        Polygon::new(vec![
            vertex(-1.0, -1.0, z),
            vertex(1.0, -1.0, z),
            vertex(1.0, 1.0, z),
            vertex(-1.0, 1.0, z),
        ])
        .unwrap()
    }

    #[test]
    fn degenerate_triangles_are_dropped() {
        let line = vec![vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(2.0, 0.0, 0.0)];
        assert!(Polygon::new(line).is_none());
    }

    #[test]
    fn classifies_whole_polygons() {
        let plane = Plane {
            normal: Vector3::unit_z(),
            w: 0.0,
        };
        assert!(matches!(plane.split(square(1.0), 1e-5), Split::Front(_)));
        assert!(matches!(plane.split(square(-1.0), 1e-5), Split::Back(_)));
        assert!(matches!(plane.split(square(0.0), 1e-5), Split::CoplanarFront(_)));
        let mut flipped = square(0.0);
        flipped.flip();
        assert!(matches!(plane.split(flipped, 1e-5), Split::CoplanarBack(_)));
    }

    #[test]
    fn spanning_polygon_is_split_with_interpolated_attributes() {
        let plane = Plane {
            normal: Vector3::unit_x(),
            w: 0.0,
        };
        let mut polygon = square(0.0);
        polygon.vertices[1].uv = Vector2::new(1.0, 0.0);
        polygon.vertices[2].uv = Vector2::new(1.0, 1.0);
        polygon.vertices[3].uv = Vector2::new(0.0, 1.0);

        let Split::Spanning {
            front: Some(front),
            back: Some(back),
        } = plane.split(polygon.clone(), 1e-5)
        else {
            panic!("square across x = 0 should span");
        };
        assert_eq!(front.vertices.len(), 4);
        assert_eq!(back.vertices.len(), 4);
        assert_eq!(front.plane, polygon.plane);
        assert!(front.vertices.iter().all(|v| v.position.x >= 0.0));
        assert!(back.vertices.iter().all(|v| v.position.x <= 0.0));
        let cut = front
            .vertices
            .iter()
            .find(|v| v.position.x == 0.0 && v.position.y == -1.0)
            .unwrap();
        assert!((cut.uv.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn invert_swaps_sides() {
        let mut node = Node::new(vec![square(0.0)], 1e-5);
        node.build(vec![square(1.0)], 1e-5);
        assert!(node.front.is_some() && node.back.is_none());
        node.invert();
        assert!(node.front.is_none() && node.back.is_some());
        assert_eq!(node.plane.unwrap().normal, -Vector3::unit_z());
    }
}
