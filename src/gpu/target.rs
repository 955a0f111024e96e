// ============================================================================
// GPU TARGET - offscreen wgpu render target implementing `RenderTarget`
// ============================================================================
//
// Draw calls are recorded as they arrive (geometry and uniforms uploaded
// immediately) and encoded into a single render pass on `flush`.  A `clear`
// discards everything recorded before it and becomes the pass's load op.
//
// Source textures are uploaded once per `(id, generation)`; the canvas quad
// therefore costs one upload per committed change, not per frame.
// ============================================================================

use std::collections::HashMap;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::UVec2;
use image::RgbaImage;
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use super::shaders;
use crate::colour::Colour;
use crate::error::{PaintError, Result};
use crate::render::{BlendMode, DrawCall, RenderTarget, ResourceCache, ShaderKind, Texture, Vertex};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Mirror of `DrawUniforms` in the primitive shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DrawUniforms {
    mvp: [[f32; 4]; 4],
    colour: [f32; 4],
    thickness: f32,
    textured: u32,
    _pad: [u32; 2],
}

/// Uploaded copy of a `Texture`, valid for one generation.
struct UploadedTexture {
    generation: u64,
    size: UVec2,
    _texture: wgpu::Texture,
    bind_group: Rc<wgpu::BindGroup>,
}

/// One recorded draw, ready to be replayed inside the pass.
struct PreparedDraw {
    pipeline: (ShaderKind, BlendMode),
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    uniforms: wgpu::BindGroup,
    texture: Rc<wgpu::BindGroup>,
}

pub struct GpuTarget {
    ctx: GpuContext,
    size: UVec2,
    target: wgpu::Texture,
    view: wgpu::TextureView,
    blend: BlendMode,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    shader: wgpu::ShaderModule,
    sampler: wgpu::Sampler,
    pipelines: ResourceCache<(ShaderKind, BlendMode), wgpu::RenderPipeline>,
    textures: HashMap<u64, UploadedTexture>,
    /// 1x1 white texture bound for untextured draws.
    blank: Rc<wgpu::BindGroup>,
    pending_clear: Option<Colour>,
    pending: Vec<PreparedDraw>,
    /// Reusable readback buffer and its size in bytes.
    staging: Option<(wgpu::Buffer, u64)>,
}

impl GpuTarget {
    pub fn new(ctx: GpuContext, width: u32, height: u32) -> Result<Self> {
        if !ctx.supports_size(width, height) {
            return Err(PaintError::InvalidSize { width, height });
        }
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("primitive_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PRIMITIVE_SHADER.into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_uniform_bgl"),
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

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_texture_bgl"),
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("primitive_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        // Nearest + clamp, matching the software sampler.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("primitive_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let (target, view) = create_target(device, width, height);

        let blank_texture = Texture::filled(1, 1, Colour::WHITE);
        let (_, blank) = upload_texture(&ctx, &texture_layout, &sampler, &blank_texture);

        Ok(Self {
            size: UVec2::new(width, height),
            target,
            view,
            blend: BlendMode::Replace,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            shader,
            sampler,
            pipelines: ResourceCache::new(),
            textures: HashMap::new(),
            blank,
            pending_clear: None,
            pending: Vec::new(),
            staging: None,
            ctx,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.ctx.adapter_name
    }

    /// Recreate the target texture; recorded draws are dropped.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if !self.ctx.supports_size(width, height) {
            return Err(PaintError::InvalidSize { width, height });
        }
        if self.size == UVec2::new(width, height) {
            return Ok(());
        }
        let (target, view) = create_target(&self.ctx.device, width, height);
        self.target = target;
        self.view = view;
        self.size = UVec2::new(width, height);
        self.pending.clear();
        self.pending_clear = None;
        Ok(())
    }

    /// Encode and submit everything recorded since the last flush.
    pub fn flush(&mut self) {
        if self.pending.is_empty() && self.pending_clear.is_none() {
            return;
        }
        let draws = std::mem::take(&mut self.pending);
        let load = match self.pending_clear.take() {
            Some(c) => {
                let [r, g, b, a] = c.normalized();
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                })
            }
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            for draw in &draws {
                let Some(pipeline) = self.pipelines.get(draw.pipeline) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &draw.uniforms, &[]);
                pass.set_bind_group(1, &draw.texture, &[]);
                pass.set_vertex_buffer(0, draw.vertices.slice(..));
                pass.set_index_buffer(draw.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }
        self.ctx.submit_one(encoder);
    }

    /// Flush, then copy the target back into CPU memory.
    pub fn read_pixels(&mut self) -> Result<RgbaImage> {
        self.flush();
        let UVec2 { x: width, y: height } = self.size;
        let bytes_per_row = aligned_bytes_per_row(width);
        let buffer_size = (bytes_per_row * height) as u64;

        let need_new = match &self.staging {
            Some((_, sz)) => *sz < buffer_size,
            None => true,
        };
        if need_new {
            let buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("readback_staging"),
                size: buffer_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.staging = Some((buffer, buffer_size));
        }
        let Some((staging, _)) = &self.staging else {
            return Err(PaintError::Gpu("readback buffer missing".to_string()));
        };

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.submit_one(encoder);

        let slice = staging.slice(..buffer_size);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.ctx.device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PaintError::Gpu(format!("readback map: {e:?}"))),
            Err(e) => return Err(PaintError::Gpu(format!("readback channel: {e}"))),
        }

        let actual_row = (width * 4) as usize;
        let mut pixels = Vec::with_capacity(actual_row * height as usize);
        {
            let mapped = slice.get_mapped_range();
            for y in 0..height as usize {
                let start = y * bytes_per_row as usize;
                pixels.extend_from_slice(&mapped[start..start + actual_row]);
            }
        }
        staging.unmap();

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| PaintError::Gpu("readback size mismatch".to_string()))
    }

    /// Upload `texture` unless this exact generation is already resident.
    fn upload(&mut self, texture: &Texture) -> Rc<wgpu::BindGroup> {
        let size = UVec2::new(texture.width().max(1), texture.height().max(1));
        if let Some(resident) = self.textures.get(&texture.id())
            && resident.generation == texture.generation()
            && resident.size == size
        {
            return Rc::clone(&resident.bind_group);
        }
        let (gpu_texture, bind_group) =
            upload_texture(&self.ctx, &self.texture_layout, &self.sampler, texture);
        log::trace!("uploaded texture #{} gen {}", texture.id(), texture.generation());
        self.textures.insert(
            texture.id(),
            UploadedTexture {
                generation: texture.generation(),
                size,
                _texture: gpu_texture,
                bind_group: Rc::clone(&bind_group),
            },
        );
        bind_group
    }

    fn ensure_pipeline(&mut self, shader: ShaderKind, blend: BlendMode) {
        let device = &self.ctx.device;
        let module = &self.shader;
        let layout = &self.pipeline_layout;
        self.pipelines.get_or_create((shader, blend), || {
            let entry_point = match shader {
                ShaderKind::Line => "vs_line",
                ShaderKind::Sprite => "vs_sprite",
            };
            let blend_state = match blend {
                BlendMode::Replace => None,
                BlendMode::AlphaOver => Some(wgpu::BlendState {
                    color: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::SrcAlpha,
                        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                        operation: wgpu::BlendOperation::Add,
                    },
                    alpha: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::One,
                        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                        operation: wgpu::BlendOperation::Add,
                    },
                }),
            };
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("primitive_pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point,
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x2,
                            1 => Float32x2,
                            2 => Float32,
                            3 => Float32x2
                        ],
                    }],
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: blend_state,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                multiview: None,
            })
        });
    }
}

impl RenderTarget for GpuTarget {
    fn size(&self) -> UVec2 {
        self.size
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn clear(&mut self, colour: Colour) {
        self.pending.clear();
        self.pending_clear = Some(colour);
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        if call.mesh.is_empty() {
            return;
        }
        self.ensure_pipeline(call.shader, self.blend);

        let textured = call.material.textured && call.texture.is_some();
        let texture = match call.texture {
            Some(t) if textured => self.upload(t),
            _ => Rc::clone(&self.blank),
        };

        let device = &self.ctx.device;
        let uniforms = DrawUniforms {
            mvp: (call.view_proj * call.model).to_cols_array_2d(),
            colour: call.material.colour,
            thickness: call.material.thickness,
            textured: textured as u32,
            _pad: [0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("draw_uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_uniform_bg"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("draw_vertices"),
            contents: bytemuck::cast_slice(&call.mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("draw_indices"),
            contents: bytemuck::cast_slice(&call.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.pending.push(PreparedDraw {
            pipeline: (call.shader, self.blend),
            vertices,
            indices,
            index_count: call.mesh.indices.len() as u32,
            uniforms: uniform_group,
            texture,
        });
    }
}

/// WGPU requires `bytes_per_row` to be a multiple of 256 for buffer copies.
fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

fn create_target(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("scene_target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn upload_texture(
    ctx: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    texture: &Texture,
) -> (wgpu::Texture, Rc<wgpu::BindGroup>) {
    let extent = wgpu::Extent3d {
        width: texture.width().max(1),
        height: texture.height().max(1),
        depth_or_array_layers: 1,
    };
    let gpu_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("primitive_texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    if texture.width() > 0 && texture.height() > 0 {
        ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texture.image().as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * extent.width),
                rows_per_image: Some(extent.height),
            },
            extent,
        );
    }
    let view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("primitive_texture_bg"),
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
    });
    (gpu_texture, Rc::new(bind_group))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readback_rows_are_256_byte_aligned() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
    }

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 96);
    }
}
