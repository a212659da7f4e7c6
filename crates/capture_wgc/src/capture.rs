//! WGC monitor capture with CPU readback of a cropped region

use crate::{CaptureError, CaptureResult, FrameData, Rect};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use windows::{
    core::Interface,
    Graphics::Capture::{Direct3D11CaptureFramePool, GraphicsCaptureItem, GraphicsCaptureSession},
    Graphics::DirectX::Direct3D11::{IDirect3DDevice, IDirect3DSurface},
    Graphics::DirectX::DirectXPixelFormat,
    Win32::Foundation::POINT,
    Win32::Graphics::Direct3D::{D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL_11_0},
    Win32::Graphics::Direct3D11::{
        D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D, D3D11_BOX,
        D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_MAPPED_SUBRESOURCE,
        D3D11_MAP_READ, D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING,
    },
    Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_SAMPLE_DESC},
    Win32::Graphics::Dxgi::IDXGIDevice,
    Win32::Graphics::Gdi::{
        GetMonitorInfoW, MonitorFromPoint, HMONITOR, MONITORINFO, MONITOR_DEFAULTTONEAREST,
    },
    Win32::System::WinRT::Direct3D11::{
        CreateDirect3D11DeviceFromDXGIDevice, IDirect3DDxgiInterfaceAccess,
    },
    Win32::System::WinRT::Graphics::Capture::IGraphicsCaptureItemInterop,
};

/// A capture rectangle resolved against the monitor that holds it
#[derive(Debug, Clone, Copy)]
pub struct MonitorCrop {
    pub hmonitor: isize,
    pub monitor: Rect,
    /// Crop relative to the monitor's top-left corner.
    pub crop: Rect,
}

/// Resolve the monitor under the centre of `rect` and clip `rect` to it.
pub fn monitor_crop_for(rect: &Rect) -> CaptureResult<MonitorCrop> {
    let (center_x, center_y) = rect.center();

    let (hmonitor, monitor) = unsafe {
        let hmonitor = MonitorFromPoint(POINT { x: center_x, y: center_y }, MONITOR_DEFAULTTONEAREST);
        let mut mi = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if !GetMonitorInfoW(hmonitor, &mut mi).as_bool() {
            return Err(CaptureError::OffScreen(*rect));
        }
        let rc = mi.rcMonitor;
        (hmonitor, Rect::from_ltrb(rc.left, rc.top, rc.right, rc.bottom))
    };

    let clipped = rect
        .intersection(&monitor)
        .ok_or(CaptureError::OffScreen(*rect))?;

    Ok(MonitorCrop {
        hmonitor: hmonitor.0 as isize,
        monitor,
        crop: clipped.relative_to((monitor.x, monitor.y)),
    })
}

struct GpuDevice {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    winrt_device: IDirect3DDevice,
}

impl GpuDevice {
    fn create() -> CaptureResult<Self> {
        unsafe {
            let mut device: Option<ID3D11Device> = None;
            let mut context: Option<ID3D11DeviceContext> = None;

            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                None,
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                Some(&[D3D_FEATURE_LEVEL_11_0]),
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )?;

            let device = device.ok_or_else(|| CaptureError::D3D11("no device returned".into()))?;
            let context = context.ok_or_else(|| CaptureError::D3D11("no context returned".into()))?;

            let dxgi_device: IDXGIDevice = device.cast()?;
            let winrt_device: IDirect3DDevice =
                CreateDirect3D11DeviceFromDXGIDevice(&dxgi_device)?.cast()?;

            Ok(Self { device, context, winrt_device })
        }
    }

    fn staging_texture(&self, width: u32, height: u32) -> CaptureResult<ID3D11Texture2D> {
        let desc = D3D11_TEXTURE2D_DESC {
            Width: width,
            Height: height,
            MipLevels: 1,
            ArraySize: 1,
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            Usage: D3D11_USAGE_STAGING,
            BindFlags: 0,
            CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
            MiscFlags: 0,
        };

        let mut texture: Option<ID3D11Texture2D> = None;
        unsafe {
            self.device.CreateTexture2D(&desc, None, Some(&mut texture))?;
        }
        texture.ok_or_else(|| CaptureError::D3D11("staging texture not created".into()))
    }
}

/// Polling capture of one monitor, cropped to a fixed rectangle
pub struct CaptureController {
    gpu: GpuDevice,
    session: Option<GraphicsCaptureSession>,
    frame_pool: Option<Direct3D11CaptureFramePool>,
    crop: Rect,
    staging: RefCell<Option<(u32, u32, ID3D11Texture2D)>>,
    started_at: Instant,
    running: Arc<AtomicBool>,
}

impl CaptureController {
    pub fn new() -> CaptureResult<Self> {
        Ok(Self {
            gpu: GpuDevice::create()?,
            session: None,
            frame_pool: None,
            crop: Rect::default(),
            staging: RefCell::new(None),
            started_at: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start capturing the monitor in `target`, cropping every frame.
    pub fn start(&mut self, target: &MonitorCrop) -> CaptureResult<()> {
        let item: GraphicsCaptureItem = unsafe {
            let interop = windows::core::factory::<GraphicsCaptureItem, IGraphicsCaptureItemInterop>()?;
            interop.CreateForMonitor(HMONITOR(target.hmonitor as _))?
        };
        let size = item.Size()?;

        let frame_pool = Direct3D11CaptureFramePool::CreateFreeThreaded(
            &self.gpu.winrt_device,
            DirectXPixelFormat::B8G8R8A8UIntNormalized,
            2,
            size,
        )?;
        let session = frame_pool.CreateCaptureSession(&item)?;
        // Not available before Windows 11; the yellow border is cosmetic.
        let _ = session.SetIsBorderRequired(false);
        let _ = session.SetIsCursorCaptureEnabled(true);

        self.crop = target.crop;
        self.started_at = Instant::now();
        self.running.store(true, Ordering::SeqCst);
        session.StartCapture()?;

        log::debug!("WGC session started: monitor {}x{}, crop {:?}", size.Width, size.Height, self.crop);

        self.session = Some(session);
        self.frame_pool = Some(frame_pool);
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(session) = self.session.take() {
            let _ = session.Close();
        }
        if let Some(pool) = self.frame_pool.take() {
            let _ = pool.Close();
        }
        self.staging.borrow_mut().take();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Latest frame if one arrived since the previous call.
    pub fn try_get_frame(&self) -> Option<FrameData> {
        if !self.is_running() {
            return None;
        }

        let frame = self.frame_pool.as_ref()?.TryGetNextFrame().ok()?;
        let size = frame.ContentSize().ok()?;
        let surface = frame.Surface().ok()?;

        match self.read_back(&surface, size.Width as u32, size.Height as u32) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("Frame readback failed: {}", e);
                None
            }
        }
    }

    fn read_back(&self, surface: &IDirect3DSurface, surface_w: u32, surface_h: u32) -> CaptureResult<FrameData> {
        let src_x = (self.crop.x.max(0) as u32).min(surface_w);
        let src_y = (self.crop.y.max(0) as u32).min(surface_h);
        let width = self.crop.width.min(surface_w - src_x);
        let height = self.crop.height.min(surface_h - src_y);
        if width == 0 || height == 0 {
            return Err(CaptureError::D3D11("crop is outside the captured surface".into()));
        }

        let mut staging = self.staging.borrow_mut();
        let texture = match staging.as_ref() {
            Some((w, h, tex)) if *w == width && *h == height => tex.clone(),
            _ => {
                let tex = self.gpu.staging_texture(width, height)?;
                *staging = Some((width, height, tex.clone()));
                tex
            }
        };

        unsafe {
            let access: IDirect3DDxgiInterfaceAccess = surface.cast()?;
            let source: ID3D11Texture2D = access.GetInterface()?;

            let src_box = D3D11_BOX {
                left: src_x,
                top: src_y,
                front: 0,
                right: src_x + width,
                bottom: src_y + height,
                back: 1,
            };
            self.gpu
                .context
                .CopySubresourceRegion(&texture, 0, 0, 0, 0, &source, 0, Some(&src_box));

            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            self.gpu.context.Map(&texture, 0, D3D11_MAP_READ, 0, Some(&mut mapped))?;

            let row_pitch = mapped.RowPitch as usize;
            let row_len = width as usize * FrameData::BYTES_PER_PIXEL;
            let mut data = Vec::with_capacity(row_len * height as usize);
            for y in 0..height as usize {
                let row = std::slice::from_raw_parts((mapped.pData as *const u8).add(y * row_pitch), row_len);
                data.extend_from_slice(row);
            }

            self.gpu.context.Unmap(&texture, 0);

            Ok(FrameData {
                data,
                width,
                height,
                timestamp: self.started_at.elapsed(),
            })
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.stop();
    }
}
