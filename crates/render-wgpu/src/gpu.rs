use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::collections::BTreeMap;
use tilehop_render::{Mesh, MeshHandle, PrimitiveKind, RenderError, Renderer};
use wgpu::util::DeviceExt;

/// Draws accepted per frame.
pub const MAX_INSTANCES: usize = 4_096;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
}

impl From<Mat4> for InstanceData {
    fn from(model: Mat4) -> Self {
        let [model_0, model_1, model_2, model_3] = model.to_cols_array_2d();
        Self {
            model_0,
            model_1,
            model_2,
            model_3,
        }
    }
}

fn interleave(mesh: &Mesh) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .zip(&mesh.colors)
        .map(|(&position, &color)| Vertex { position, color })
        .collect()
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    primitive: PrimitiveKind,
}

/// The frame being assembled through the [`Renderer`] calls.
struct PendingFrame {
    view_proj: Mat4,
    batches: BTreeMap<MeshHandle, Vec<InstanceData>>,
    instance_count: usize,
}

impl Default for PendingFrame {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY,
            batches: BTreeMap::new(),
            instance_count: 0,
        }
    }
}

/// wgpu-based renderer.
///
/// The [`Renderer`] calls only touch CPU-side state. [`WgpuRenderer::submit`]
/// uploads new meshes and encodes the last presented frame.
pub struct WgpuRenderer {
    triangle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    meshes: Vec<Mesh>,
    gpu_meshes: Vec<GpuMesh>,
    building: PendingFrame,
    presented: PendingFrame,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let triangle_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            wgpu::PrimitiveTopology::TriangleList,
            "triangle_pipeline",
        );
        let line_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            wgpu::PrimitiveTopology::LineList,
            "line_pipeline",
        );

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (MAX_INSTANCES * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            triangle_pipeline,
            line_pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            depth_texture,
            surface_format,
            meshes: Vec::new(),
            gpu_meshes: Vec::new(),
            building: PendingFrame::default(),
            presented: PendingFrame::default(),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Encode and submit the last presented frame into `view`.
    pub fn submit(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        self.upload_pending(device);

        let frame = &self.presented;
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: frame.view_proj.to_cols_array_2d(),
            }),
        );

        // Instances are laid out batch after batch; remember each range.
        let mut instances: Vec<InstanceData> = Vec::with_capacity(frame.instance_count);
        let mut ranges = Vec::with_capacity(frame.batches.len());
        for (handle, batch) in &frame.batches {
            let start = instances.len() as u32;
            instances.extend_from_slice(batch);
            ranges.push((*handle, start..instances.len() as u32));
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 0.0,
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

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (handle, range) in ranges {
                let Some(mesh) = self.gpu_meshes.get(handle.0 as usize) else {
                    continue;
                };
                let pipeline = match mesh.primitive {
                    PrimitiveKind::Triangles => &self.triangle_pipeline,
                    PrimitiveKind::Lines => &self.line_pipeline,
                };
                pass.set_pipeline(pipeline);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.draw(0..mesh.vertex_count, range);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn upload_pending(&mut self, device: &wgpu::Device) {
        for mesh in &self.meshes[self.gpu_meshes.len()..] {
            let vertices = interleave(mesh);
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&mesh.name),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            tracing::debug!(name = %mesh.name, vertices = vertices.len(), "mesh uploaded to GPU");
            self.gpu_meshes.push(GpuMesh {
                vertex_buffer,
                vertex_count: vertices.len() as u32,
                primitive: mesh.primitive,
            });
        }
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
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
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

impl Renderer for WgpuRenderer {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle, RenderError> {
        mesh.validate()?;
        let handle = MeshHandle(self.meshes.len() as u32);
        self.meshes.push(mesh.clone());
        Ok(handle)
    }

    fn clear(&mut self) {
        self.building = PendingFrame::default();
    }

    fn set_view_projection(&mut self, view_proj: Mat4) {
        self.building.view_proj = view_proj;
    }

    fn draw(&mut self, mesh: MeshHandle, model: Mat4) -> Result<(), RenderError> {
        if mesh.0 as usize >= self.meshes.len() {
            return Err(RenderError::UnknownMesh(mesh));
        }
        if self.building.instance_count >= MAX_INSTANCES {
            return Err(RenderError::InstanceBudgetExceeded {
                limit: MAX_INSTANCES,
            });
        }
        self.building
            .batches
            .entry(mesh)
            .or_default()
            .push(InstanceData::from(model));
        self.building.instance_count += 1;
        Ok(())
    }

    fn present(&mut self) {
        self.presented = std::mem::take(&mut self.building);
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn interleave_pairs_positions_with_colors() {
        let mesh = Mesh::floor_tile();
        let vertices = interleave(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertices[0].position, mesh.positions[0]);
        assert_eq!(vertices[35].color, mesh.colors[35]);
    }

    #[test]
    fn instance_data_holds_matrix_columns() {
        let model = Mat4::from_translation(Vec3::new(2.0, 3.0, 1.5));
        let data = InstanceData::from(model);
        assert_eq!(data.model_3, [2.0, 3.0, 1.5, 1.0]);
        assert_eq!(data.model_0, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn gpu_structs_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(std::mem::size_of::<InstanceData>(), 64);
        assert_eq!(std::mem::size_of::<Uniforms>(), 64);
    }
}
