// ============================================================================
// GPU CONTEXT - wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::sync::Arc;

use crate::error::{PaintError, Result};
use crate::settings::GpuPreference;

/// Core wgpu resources for the on-screen scene target.
/// Created once at startup; if creation fails the session renders in software.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
}

impl GpuContext {
    /// Tries a hardware adapter first, then the software rasterizer
    /// (`force_fallback_adapter`).
    ///
    /// `pollster::block_on` is used because eframe doesn't expose its wgpu
    /// device to application code; the scene target owns its own device.
    pub fn new(preference: GpuPreference) -> Result<Self> {
        match pollster::block_on(Self::new_async(preference, false)) {
            Ok(ctx) => return Ok(ctx),
            Err(e) => log::warn!("hardware adapter unavailable ({e}), trying software fallback"),
        }
        pollster::block_on(Self::new_async(preference, true))
    }

    async fn new_async(preference: GpuPreference, force_fallback: bool) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power = match preference {
            GpuPreference::LowPower => wgpu::PowerPreference::LowPower,
            GpuPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
            GpuPreference::Auto => wgpu::PowerPreference::default(),
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power,
                compatible_surface: None, // offscreen only
                force_fallback_adapter: force_fallback,
            })
            .await
            .ok_or_else(|| PaintError::Initialization("no compatible GPU adapter".to_string()))?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("PaintGL GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
            .map_err(|e| PaintError::Initialization(format!("request_device: {e}")))?;

        log::info!("GPU adapter: {adapter_name}");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
        })
    }

    /// Check if a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width > 0 && height > 0 && width <= self.max_texture_dim && height <= self.max_texture_dim
    }

    /// Submit a single encoder's commands.
    pub fn submit_one(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
