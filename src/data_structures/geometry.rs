//! CPU-side indexed triangle geometry.
//!
//! Generators follow the usual conventions of a scene library: planes are
//! built in the XY plane facing +Z and rotated into place, boxes are centred
//! on the origin with one quad per face. All triangles wind counter-clockwise
//! when seen from the side their normal points to.

use cgmath::{InnerSpace, Matrix3, Rad, Vector3};

use crate::data_structures::model::MeshVertex;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Axis-aligned bounds of a geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

impl Geometry {
    /// A `width` x `height` grid split into `width_segments` x `height_segments`
    /// quads, lying in the XY plane and facing +Z.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let grid_x1 = grid_x + 1;
        let grid_y1 = grid_y + 1;
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;
        let width_half = width / 2.0;
        let height_half = height / 2.0;

        let mut vertices = Vec::with_capacity((grid_x1 * grid_y1) as usize);
        for iy in 0..grid_y1 {
            let y = iy as f32 * segment_height - height_half;
            for ix in 0..grid_x1 {
                let x = ix as f32 * segment_width - width_half;
                vertices.push(MeshVertex {
                    position: [x, -y, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    tex_coords: [ix as f32 / grid_x as f32, iy as f32 / grid_y as f32],
                });
            }
        }

        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + grid_x1 * iy;
                let b = ix + grid_x1 * (iy + 1);
                let c = (ix + 1) + grid_x1 * (iy + 1);
                let d = (ix + 1) + grid_x1 * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    /// A box centred on the origin. Each face is its own quad so that normals
    /// and UVs stay flat per face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
        // (normal, u axis, v axis) with u x v == normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let extent = |axis: Vector3<f32>| {
            axis.x.abs() * half.x + axis.y.abs() * half.y + axis.z.abs() * half.z
        };

        let mut geometry = Self::default();
        for (normal, u, v) in faces {
            let (normal, u, v) = (Vector3::from(normal), Vector3::from(u), Vector3::from(v));
            let center = normal * extent(normal);
            let (u_half, v_half) = (u * extent(u), v * extent(v));
            let base = geometry.vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = center + u_half * su + v_half * sv;
                geometry.vertices.push(MeshVertex {
                    position: position.into(),
                    normal: normal.into(),
                    // wgpu samples with v pointing down
                    tex_coords: [(su + 1.0) / 2.0, 1.0 - (sv + 1.0) / 2.0],
                });
            }
            geometry
                .indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        geometry
    }

    pub fn rotate_x(&mut self, angle: impl Into<Rad<f32>>) -> &mut Self {
        let rotation = Matrix3::from_angle_x(angle.into());
        self.vertices.iter_mut().for_each(|vertex| {
            vertex.position = (rotation * Vector3::from(vertex.position)).into();
            vertex.normal = (rotation * Vector3::from(vertex.normal)).into();
        });
        self
    }

    pub fn translate(&mut self, offset: Vector3<f32>) -> &mut Self {
        self.vertices.iter_mut().for_each(|vertex| {
            vertex.position = (Vector3::from(vertex.position) + offset).into();
        });
        self
    }

    /// Positions only; the terrain drops UVs and normals before upload.
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|vertex| vertex.position).collect()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [&MeshVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        let first = Vector3::from(self.vertices.first()?.position);
        let bounds = self.vertices.iter().fold(
            Aabb {
                min: first,
                max: first,
            },
            |acc, vertex| {
                let p = Vector3::from(vertex.position);
                Aabb {
                    min: Vector3::new(acc.min.x.min(p.x), acc.min.y.min(p.y), acc.min.z.min(p.z)),
                    max: Vector3::new(acc.max.x.max(p.x), acc.max.y.max(p.y), acc.max.z.max(p.z)),
                }
            },
        );
        Some(bounds)
    }

    /// Signed enclosed volume. Positive for closed, outward-wound meshes.
    pub fn volume(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| {
                let (a, b, c) = (
                    Vector3::from(a.position),
                    Vector3::from(b.position),
                    Vector3::from(c.position),
                );
                a.dot(b.cross(c)) / 6.0
            })
            .sum()
    }

    /// Total surface area of all triangles.
    pub fn area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| {
                let a = Vector3::from(a.position);
                (Vector3::from(b.position) - a)
                    .cross(Vector3::from(c.position) - a)
                    .magnitude()
                    / 2.0
            })
            .sum()
    }
}
