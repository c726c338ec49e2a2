//! Window creation and event handling via winit.
//!
//! [`App`] implements winit's [`ApplicationHandler`], owning the window, the
//! [`RenderContext`] and the background catalog loader. [`run`] builds the
//! event loop and blocks until the window closes.

use std::sync::Arc;
use std::time::Instant;

use starmap_config::Config;
use starmap_render::{SurfaceError, init_gpu_context_blocking};
use starmap_scene::CatalogLoader;
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::redraw::RedrawReason;
use crate::render_context::RenderContext;

/// Events sent to the loop from other threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The catalog loader has a result waiting.
    CatalogReady,
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

pub struct App {
    config: Config,
    window: Option<Arc<Window>>,
    context: RenderContext,
    loader: Option<CatalogLoader>,
    proxy: EventLoopProxy<AppEvent>,
}

impl App {
    pub fn new(config: Config, proxy: EventLoopProxy<AppEvent>) -> Self {
        let context = RenderContext::new(&config, config.window.width, config.window.height, 1.0);
        Self {
            config,
            window: None,
            context,
            loader: None,
            proxy,
        }
    }

    /// Start reading the catalog in the background. Failure to start leaves
    /// the scene empty.
    pub fn start_catalog_load(&mut self) {
        let path = self.config.catalog.path.clone();
        let proxy = self.proxy.clone();
        match CatalogLoader::spawn(path.clone(), move || {
            // The loop may already be gone during shutdown.
            let _ = proxy.send_event(AppEvent::CatalogReady);
        }) {
            Ok(loader) => {
                info!("Loading star catalog from {}", path.display());
                self.loader = Some(loader);
            }
            Err(e) => warn!("Could not start catalog loader: {e}"),
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    fn poke(&self, needed: bool) {
        if needed && let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        match self.context.frame(Instant::now()) {
            Ok((_, reschedule)) => self.poke(reschedule),
            Err(e @ (SurfaceError::Timeout | SurfaceError::Lost)) => {
                warn!("Skipping frame: {e}");
                // Keep the scripted orbit going; on-demand frames wait for input.
                let needed = self.context.driver.is_animating()
                    && self.context.request_redraw(RedrawReason::Animation);
                self.poke(needed);
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, exiting");
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = window_attributes_from_config(&self.config);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let inner_size = window.inner_size();
        let scale_factor = window.scale_factor();
        self.context
            .handle_scale_factor_changed(scale_factor, inner_size.width, inner_size.height);
        info!(
            "Window created: {}x{} (scale: {:.2})",
            inner_size.width, inner_size.height, scale_factor
        );

        match init_gpu_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(gpu) => self.context.attach_gpu(gpu),
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window.clone());
        self.context.request_redraw(RedrawReason::Initial);
        window.request_redraw();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::CatalogReady => {
                let Some(result) = self.loader.as_mut().and_then(CatalogLoader::try_take) else {
                    return;
                };
                self.loader = None;
                match result {
                    Ok(records) => {
                        let (_, needed) = self.context.populate(&records);
                        self.poke(needed);
                    }
                    Err(e) => warn!("Star catalog unavailable, keeping empty scene: {e}"),
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let needed = self
                    .context
                    .handle_resize(new_size.width, new_size.height);
                self.poke(needed);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(window) = &self.window {
                    let inner = window.inner_size();
                    let needed = self.context.handle_scale_factor_changed(
                        scale_factor,
                        inner.width,
                        inner.height,
                    );
                    info!("Scale factor changed to {scale_factor:.2}");
                    self.poke(needed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let needed = self.context.on_cursor_moved(position.x, position.y);
                self.poke(needed);
            }
            WindowEvent::CursorEntered { .. } => self.context.mouse.on_cursor_entered(),
            WindowEvent::CursorLeft { .. } => self.context.mouse.on_cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => {
                self.context.on_mouse_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let needed = self.context.on_scroll(delta);
                self.poke(needed);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Create the event loop, start the catalog load and run until the window
/// closes.
#[instrument(skip(config))]
pub fn run(config: Config) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    let mut app = App::new(config, event_loop.create_proxy());
    app.start_catalog_load();
    event_loop.run_app(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_attributes_from_config() {
        let mut config = Config::default();
        config.window.title = "Local bubble".to_string();
        let attrs = window_attributes_from_config(&config);
        assert_eq!(attrs.title, "Local bubble");
        assert_eq!(
            attrs.inner_size,
            Some(winit::dpi::Size::Logical(winit::dpi::LogicalSize::new(
                1280.0, 720.0
            )))
        );
    }
}
