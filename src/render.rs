//! Scene graph renderer.
//!
//! [`MeshRenderer`] walks the scene graph from its roots, accumulates world
//! matrices, and draws every visible mesh in three passes: opaque triangles,
//! additive triangles, then points. GPU buffers and textures are created
//! lazily from the CPU-side resources, re-uploaded when a geometry is marked
//! dirty, and reclaimed the frame after their resource is disposed — which is
//! what makes page teardown free GPU memory without the renderer being told.
//!
//! # Bind Groups
//!
//! - **Group 0**: camera uniforms (view-projection, camera position, time)
//! - **Group 1**: model uniforms (model matrix, normal matrix, colors, flags)
//! - **Group 2**: base colour texture and sampler

use crate::camera::Camera;
use crate::geometry::{Geometry, GeometryId, Topology, Vertex3d};
use crate::gpu::GpuContext;
use crate::graph::SceneGraph;
use crate::material::{Blend, Material};
use crate::texture::{Texture, TextureId};
use glam::Mat4;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Camera uniforms uploaded once per frame.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 3],
    time: f32,
}

/// Per-draw model uniforms.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ModelUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
    /// x: unlit flag (1.0 skips lighting), yzw unused.
    flags: [f32; 4],
}

/// GPU copy of a [`Geometry`].
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
    vertex_count: u32,
    vertex_capacity: usize,
    /// Weak handle back to the CPU resource, checked for disposal.
    source: Weak<Geometry>,
}

/// GPU copy of a [`Texture`] with its ready-made bind group. The bind group
/// keeps the underlying wgpu texture and view alive.
struct GpuTexture {
    bind_group: wgpu::BindGroup,
    source: Weak<Texture>,
}

/// One resolved draw for the current frame.
struct DrawItem {
    geometry: Rc<Geometry>,
    material: Rc<Material>,
    model: Mat4,
}

/// Renders the scene graph, owning all pipelines and GPU resource caches.
pub struct MeshRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    additive_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    default_texture_bind_group: wgpu::BindGroup,
    meshes: HashMap<GeometryId, GpuMesh>,
    textures: HashMap<TextureId, GpuTexture>,
}

impl MeshRenderer {
    /// Build the pipelines, uniform buffers, default texture, and depth
    /// buffer sized to the current surface.
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });
        let points_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/points.wgsl").into()),
        });

        // Camera uniform buffer (group 0)
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Model uniform buffer (group 1)
        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: std::mem::size_of::<ModelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Model Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout: &model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });

        // Texture bind group layout (group 2)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Mesh Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // 1x1 white fallback for untextured materials
        let white = Texture::from_rgba(vec![255, 255, 255, 255], 1, 1, "Default White Texture");
        let default_texture_bind_group =
            upload_texture(gpu, &white, &texture_bind_group_layout, &sampler);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                &model_bind_group_layout,
                &texture_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let make_triangle_pipeline = |label: &str, blend: wgpu::BlendState, depth_write: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &mesh_shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &mesh_shader,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    // No culling: rings and panels are visible from both sides.
                    cull_mode: None,
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let opaque_pipeline =
            make_triangle_pipeline("Opaque Mesh Pipeline", wgpu::BlendState::ALPHA_BLENDING, true);
        let additive_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };
        let additive_pipeline =
            make_triangle_pipeline("Additive Mesh Pipeline", additive_blend, false);

        let points_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &points_shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &points_shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(additive_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_view = create_depth_view(gpu);

        Self {
            opaque_pipeline,
            additive_pipeline,
            points_pipeline,
            camera_buffer,
            camera_bind_group,
            model_buffer,
            model_bind_group,
            texture_bind_group_layout,
            sampler,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
            default_texture_bind_group,
            meshes: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    /// Draw one frame of the whole graph.
    pub fn render(&mut self, gpu: &GpuContext, graph: &SceneGraph, camera: &Camera, time: f32) {
        self.ensure_depth_size(gpu);
        self.reclaim_disposed();

        // Resolve visible meshes with their world matrices, bucketed by pass.
        let mut opaque = Vec::new();
        let mut additive = Vec::new();
        let mut points = Vec::new();
        for root in graph.roots() {
            collect_draws(
                graph,
                root,
                Mat4::IDENTITY,
                &mut opaque,
                &mut additive,
                &mut points,
            );
        }

        for item in opaque.iter().chain(&additive).chain(&points) {
            self.upload(gpu, item);
        }

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                log::warn!("dropped frame: {e}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let camera_uniforms = CameraUniforms {
            view_proj: camera.view_proj().to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            time,
        };
        gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniforms]),
        );

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.004,
                            g: 0.004,
                            b: 0.012,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            pass.set_pipeline(&self.opaque_pipeline);
            for item in &opaque {
                self.draw(gpu, &mut pass, item);
            }
            pass.set_pipeline(&self.additive_pipeline);
            for item in &additive {
                self.draw(gpu, &mut pass, item);
            }
            pass.set_pipeline(&self.points_pipeline);
            for item in &points {
                self.draw(gpu, &mut pass, item);
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }

    /// Issue one draw: write model uniforms, bind texture, draw geometry.
    fn draw(&self, gpu: &GpuContext, pass: &mut wgpu::RenderPass, item: &DrawItem) {
        let Some(mesh) = self.meshes.get(&item.geometry.id()) else {
            return;
        };

        let normal_matrix = item.model.inverse().transpose();
        let m = &item.material;
        let uniforms = ModelUniforms {
            model: item.model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color: [m.color.r, m.color.g, m.color.b, m.color.a],
            emissive: [m.emissive.r, m.emissive.g, m.emissive.b, m.emissive.a],
            flags: [if m.unlit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.model_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        pass.set_bind_group(1, &self.model_bind_group, &[]);

        let texture_bind_group = item
            .material
            .color_map
            .as_ref()
            .and_then(|t| self.textures.get(&t.id()))
            .map(|t| &t.bind_group)
            .unwrap_or(&self.default_texture_bind_group);
        pass.set_bind_group(2, texture_bind_group, &[]);

        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        match &mesh.index_buffer {
            Some(index_buffer) => {
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
            None => pass.draw(0..mesh.vertex_count, 0..1),
        }
    }

    /// Upload or refresh the GPU copies a draw item needs.
    fn upload(&mut self, gpu: &GpuContext, item: &DrawItem) {
        let geometry = &item.geometry;
        let id = geometry.id();
        let dirty = geometry.take_dirty();

        let needs_new = match self.meshes.get(&id) {
            None => true,
            Some(mesh) => dirty && geometry.vertices.borrow().len() > mesh.vertex_capacity,
        };

        if needs_new {
            let vertices = geometry.vertices.borrow();
            let vertex_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Vertex Buffer"),
                size: (vertices.len() * std::mem::size_of::<Vertex3d>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            gpu.queue
                .write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&vertices));

            let index_buffer = (!geometry.indices.is_empty()).then(|| {
                let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Index Buffer"),
                    size: (geometry.indices.len() * std::mem::size_of::<u32>()) as u64,
                    usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                gpu.queue
                    .write_buffer(&buffer, 0, bytemuck::cast_slice(&geometry.indices));
                buffer
            });

            self.meshes.insert(
                id,
                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: geometry.indices.len() as u32,
                    vertex_count: vertices.len() as u32,
                    vertex_capacity: vertices.len(),
                    source: Rc::downgrade(geometry),
                },
            );
        } else if dirty {
            if let Some(mesh) = self.meshes.get_mut(&id) {
                let vertices = geometry.vertices.borrow();
                gpu.queue
                    .write_buffer(&mesh.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
                mesh.vertex_count = vertices.len() as u32;
            }
        }

        if let Some(texture) = &item.material.color_map {
            if !self.textures.contains_key(&texture.id()) {
                let bind_group =
                    upload_texture(gpu, texture, &self.texture_bind_group_layout, &self.sampler);
                self.textures.insert(
                    texture.id(),
                    GpuTexture {
                        bind_group,
                        source: Rc::downgrade(texture),
                    },
                );
            }
        }
    }

    /// Drop GPU copies whose CPU resource was disposed or fully dropped.
    fn reclaim_disposed(&mut self) {
        self.meshes
            .retain(|_, m| m.source.upgrade().is_some_and(|g| !g.is_disposed()));
        self.textures
            .retain(|_, t| t.source.upgrade().is_some_and(|x| !x.is_disposed()));
    }

    /// Recreate the depth buffer when the surface size has changed.
    fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }
}

// The view keeps the texture alive; only the view is stored.
fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_texture(
    gpu: &GpuContext,
    texture: &Texture,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let gpu_texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&texture.label),
        size: wgpu::Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &gpu_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texture.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(texture.width * 4),
            rows_per_image: Some(texture.height),
        },
        wgpu::Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        },
    );
    let view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());
    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Mesh Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// Depth-first traversal collecting visible meshes into pass buckets.
fn collect_draws(
    graph: &SceneGraph,
    id: crate::graph::NodeId,
    parent: Mat4,
    opaque: &mut Vec<DrawItem>,
    additive: &mut Vec<DrawItem>,
    points: &mut Vec<DrawItem>,
) {
    let Some(node) = graph.get(id) else { return };
    if !node.visible {
        return;
    }
    let model = parent * node.transform.matrix();

    if let Some(mesh) = &node.mesh {
        if !mesh.geometry.is_disposed() {
            for material in &mesh.materials {
                if material.is_disposed() {
                    continue;
                }
                let item = DrawItem {
                    geometry: mesh.geometry.clone(),
                    material: material.clone(),
                    model,
                };
                match mesh.geometry.topology {
                    Topology::Points => points.push(item),
                    Topology::Triangles => match material.blend {
                        Blend::Opaque => opaque.push(item),
                        Blend::Additive => additive.push(item),
                    },
                }
            }
        }
    }

    for child in node.children() {
        collect_draws(graph, *child, model, opaque, additive, points);
    }
}
