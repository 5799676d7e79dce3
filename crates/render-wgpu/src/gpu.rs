use std::collections::{HashMap, HashSet};

use bytemuck::{Pod, Zeroable};
use cascadeview_assets::{MeshData, TextureData};
use cascadeview_common::ObjectId;
use cascadeview_network::{NetworkSpec, PackedWeightTexture};
use cascadeview_render::RenderView;
use cascadeview_scene::{AppearanceMaterial, SceneComposer, SceneObject};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::shaders;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    mode: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// One mesh leaf on the GPU, with its own draw uniforms.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Uploaded resources of one attached cascade object.
struct GpuCascade {
    hidden_dim: usize,
    meshes: Vec<GpuMesh>,
}

/// Draws composed cascades with the appearance program.
///
/// Pipelines are built once per hidden dimension. Cascade resources are
/// uploaded the first frame an object appears and dropped the first frame
/// it is gone.
pub struct WgpuRenderer {
    draw_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<usize, wgpu::RenderPipeline>,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    cascades: HashMap<ObjectId, GpuCascade>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    size: [u32; 2],
}

fn texture_entry(binding: u32, filterable: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                camera_position: [0.0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1, true),
                texture_entry(2, true),
                texture_entry(3, false),
                texture_entry(4, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("appearance_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nearest_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            draw_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            frame_buffer,
            frame_bind_group,
            sampler,
            cascades: HashMap::new(),
            depth_texture: Self::create_depth_texture(device, width, height),
            surface_format,
            size: [width.max(1), height.max(1)],
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
        self.size = [width.max(1), height.max(1)];
    }

    /// Viewport clamped to the render target, never empty.
    pub fn clamp_viewport(&self, viewport: [u32; 2]) -> [u32; 2] {
        [
            viewport[0].clamp(1, self.size[0]),
            viewport[1].clamp(1, self.size[1]),
        ]
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Number of compiled appearance programs.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Number of cascades currently resident on the GPU.
    pub fn resident_cascades(&self) -> usize {
        self.cascades.len()
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, spec: &NetworkSpec) {
        if self.pipelines.contains_key(&spec.hidden_dim) {
            return;
        }
        tracing::info!(hidden = spec.hidden_dim, "compiling appearance program");
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("appearance_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::appearance_shader(spec).into()),
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("appearance_pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        self.pipelines.insert(spec.hidden_dim, pipeline);
    }

    fn upload_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &TextureData,
    ) -> wgpu::TextureView {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width.max(1),
                    height: image.height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.rgba,
        );
        texture.create_view(&Default::default())
    }

    fn upload_weights(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        weights: &PackedWeightTexture,
    ) -> wgpu::TextureView {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: weights.width(),
                    height: weights.height().max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba32Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            weights.as_bytes(),
        );
        texture.create_view(&Default::default())
    }

    fn upload_cascade(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        object: &SceneObject,
    ) -> Option<GpuCascade> {
        let material: &AppearanceMaterial = object.root.first_material()?;
        let spec = material.network.spec();
        self.ensure_pipeline(device, &spec);

        let diffuse = Self::upload_image(device, queue, "diffuse", &material.diffuse);
        let specular = Self::upload_image(device, queue, "specular", &material.specular);
        let weights_zero =
            Self::upload_weights(device, queue, "weights_zero", material.network.layer0());
        let weights_one =
            Self::upload_weights(device, queue, "weights_one", material.network.layer1());

        let mut meshes = Vec::new();
        object.root.visit_meshes(&mut |leaf| {
            if let Some(mesh) = self.upload_mesh(
                device,
                &leaf.mesh,
                [&diffuse, &specular, &weights_zero, &weights_one],
            ) {
                meshes.push(mesh);
            }
        });
        tracing::debug!(
            object = %object.id.short(),
            scene = %object.scene,
            cascade = object.cascade,
            meshes = meshes.len(),
            "cascade uploaded"
        );
        Some(GpuCascade {
            hidden_dim: spec.hidden_dim,
            meshes,
        })
    }

    fn upload_mesh(
        &self,
        device: &wgpu::Device,
        mesh: &MeshData,
        views: [&wgpu::TextureView; 4],
    ) -> Option<GpuMesh> {
        if mesh.indices.is_empty() {
            return None;
        }
        let vertices: Vec<Vertex> = mesh
            .positions
            .iter()
            .zip(&mesh.uvs)
            .map(|(&position, &uv)| Vertex { position, uv })
            .collect();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cascade_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cascade_index_buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("draw_uniforms"),
            contents: bytemuck::bytes_of(&DrawUniforms {
                model: Mat4::IDENTITY.to_cols_array_2d(),
                mode: 0,
                _pad: [0; 3],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let [diffuse, specular, weights_zero, weights_one] = views;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout: &self.draw_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(diffuse),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(specular),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(weights_zero),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(weights_one),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        Some(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
        })
    }

    /// Upload newly attached objects and drop resources of removed ones.
    fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, composer: &SceneComposer) {
        let live: HashSet<ObjectId> = composer.all_objects().map(|o| o.id).collect();
        self.cascades.retain(|id, _| live.contains(id));
        for object in composer.all_objects() {
            if self.cascades.contains_key(&object.id) {
                continue;
            }
            if let Some(cascade) = self.upload_cascade(device, queue, object) {
                self.cascades.insert(object.id, cascade);
            }
        }
    }

    /// Render one frame of every composed cascade into the top-left
    /// `viewport` of `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        composer: &SceneComposer,
        view: &RenderView,
        viewport: [u32; 2],
    ) {
        self.sync(device, queue, composer);
        let [vw, vh] = self.clamp_viewport(viewport);
        let aspect = vw as f32 / vh as f32;

        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms {
                view_proj: view.view_proj(aspect).to_cols_array_2d(),
                camera_position: view.eye.extend(1.0).to_array(),
            }),
        );

        // per-leaf uniforms: transform from the object, mode from the leaf
        for object in composer.all_objects() {
            let Some(cascade) = self.cascades.get(&object.id) else {
                continue;
            };
            let model = object.transform.matrix().to_cols_array_2d();
            let mut leaf = 0;
            object.root.visit_meshes(&mut |node| {
                if let Some(mesh) = cascade.meshes.get(leaf) {
                    queue.write_buffer(
                        &mesh.uniform_buffer,
                        0,
                        bytemuck::bytes_of(&DrawUniforms {
                            model,
                            mode: node.material.mode.index(),
                            _pad: [0; 3],
                        }),
                    );
                }
                leaf += 1;
            });
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let [r, g, b] = view.background;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("appearance_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for cascade in self.cascades.values() {
                let Some(pipeline) = self.pipelines.get(&cascade.hidden_dim) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                for mesh in &cascade.meshes {
                    pass.set_bind_group(1, &mesh.bind_group, &[]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 80);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 80);
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
    }
}
