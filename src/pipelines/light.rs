use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Vector3, ortho};
use wgpu::util::DeviceExt;

use crate::{
    camera::{CameraUniform, OPENGL_TO_WGPU_MATRIX},
    config::{LightConfig, RendererConfig},
    data_structures::texture::Texture,
};

/// Directional light as the lit shaders see it (`LightUniform` in
/// `lighting.wgsl`).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub view_proj: [[f32; 4]; 4],
    pub direction: [f32; 4],
    pub color: [f32; 4],
    /// exposure, shadow map size, shadows enabled, environment intensity
    pub params: [f32; 4],
}

impl LightUniform {
    pub fn new(config: &LightConfig, renderer: &RendererConfig) -> Self {
        let direction = (config.position - config.target).normalize();
        let [r, g, b] = config.color.to_linear();
        let intensity = config.intensity;
        Self {
            view_proj: light_view_proj(config).into(),
            direction: direction.extend(0.0).into(),
            color: [r * intensity, g * intensity, b * intensity, intensity],
            params: [
                renderer.exposure,
                config.shadow_map_size as f32,
                if renderer.shadows { 1.0 } else { 0.0 },
                1.0,
            ],
        }
    }
}

/// Orthographic view-projection of the shadow camera.
pub fn light_view_proj(config: &LightConfig) -> Matrix4<f32> {
    let mut up = Vector3::unit_y();
    if (config.position - config.target).normalize().cross(up).magnitude2() < 1e-6 {
        up = Vector3::unit_z();
    }
    let view = Matrix4::look_at_rh(config.position, config.target, up);
    let projection = ortho(
        config.shadow_left,
        config.shadow_right,
        config.shadow_bottom,
        config.shadow_top,
        config.shadow_near,
        config.shadow_far,
    );
    OPENGL_TO_WGPU_MATRIX * projection * view
}

/// The light, its shadow map and the environment map, plus the view the
/// shadow pass renders with.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub shadow_map: Texture,
    pub environment: Texture,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Group 0 of the shadow pipelines.
    pub shadow_view_bind_group: wgpu::BindGroup,
    pub casts_shadows: bool,
}

impl LightResources {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &LightConfig,
        renderer: &RendererConfig,
        bind_group_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let uniform = LightUniform::new(config, renderer);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shadow_map = Texture::create_shadow_map(device, config.shadow_map_size);
        // single-texel placeholder until the real environment is loaded
        let placeholder = image::Rgba32FImage::from_pixel(1, 1, image::Rgba([1.0, 1.0, 1.0, 1.0]));
        let environment = Texture::from_environment(device, queue, &placeholder, "environment");

        let shadow_view = CameraUniform {
            view_position: config.position.to_homogeneous().into(),
            view_proj: uniform.view_proj,
        };
        let shadow_view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow View Buffer"),
            contents: bytemuck::cast_slice(&[shadow_view]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let shadow_view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_view_buffer.as_entire_binding(),
            }],
            label: Some("shadow_view_bind_group"),
        });

        let bind_group = mk_bind_group(device, bind_group_layout, &buffer, &shadow_map, &environment);
        log::info!(
            "light at {:?} ({}x{} shadow map)",
            config.position.to_vec(),
            config.shadow_map_size,
            config.shadow_map_size
        );

        Self {
            uniform,
            buffer,
            shadow_map,
            environment,
            bind_group,
            bind_group_layout: bind_group_layout.clone(),
            shadow_view_bind_group,
            casts_shadows: renderer.shadows,
        }
    }

    /// Swaps in a new environment map and rebuilds the bind group.
    pub fn set_environment(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::Rgba32FImage,
    ) {
        self.environment = Texture::from_environment(device, queue, img, "environment");
        self.bind_group = mk_bind_group(
            device,
            &self.bind_group_layout,
            &self.buffer,
            &self.shadow_map,
            &self.environment,
        );
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    shadow_map: &Texture,
    environment: &Texture,
) -> wgpu::BindGroup {
    let shadow_sampler = shadow_map
        .sampler
        .clone()
        .unwrap_or_else(|| device.create_sampler(&comparison_sampler()));
    let environment_sampler = environment
        .sampler
        .clone()
        .unwrap_or_else(|| device.create_sampler(&wgpu::SamplerDescriptor::default()));
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&shadow_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&shadow_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&environment.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&environment_sampler),
            },
        ],
        label: Some("light_bind_group"),
    })
}

fn comparison_sampler() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Point3, Vector4};

    use super::*;

    #[test]
    fn shadow_camera_covers_the_board() {
        let view_proj = light_view_proj(&LightConfig::default());
        for corner in [(-5.5, -1.0, -5.5), (5.5, -1.0, 5.5), (-5.5, 2.6, 5.5), (5.5, 2.6, -5.5)] {
            let p = Point3::from(corner);
            let clip = view_proj * Vector4::new(p.x, p.y, p.z, 1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{corner:?} -> {ndc:?}");
            assert!((0.0..=1.0).contains(&ndc.z), "{corner:?} -> {ndc:?}");
        }
    }

    #[test]
    fn color_carries_intensity() {
        let uniform = LightUniform::new(&LightConfig::default(), &RendererConfig::default());
        assert!((uniform.color[0] - 2.15).abs() < 1e-4);
        assert!((uniform.params[0] - 0.7).abs() < 1e-6);
        let d = Vector3::new(uniform.direction[0], uniform.direction[1], uniform.direction[2]);
        assert!((d.magnitude() - 1.0).abs() < 1e-5);
    }
}
