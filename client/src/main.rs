use std::cell::RefCell;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

mod camera;
mod collision;
mod config;
mod error;
mod game;
mod game_ui;
mod gpu;
mod input;
mod level;
mod materials;
mod maze;
mod mesh;
mod models;
mod player;
mod render;
mod settings;
mod textures;

use game::GameState;
use game_ui::Hud;
use input::InputState;
use render::Renderer;
use settings::Settings;

struct ClientState {
    renderer: Renderer,
    game: GameState,
    input: InputState,
    hud: Hud,
}

thread_local! {
    static STATE: RefCell<Option<ClientState>> = const { RefCell::new(None) };
}

fn with_state(f: impl FnOnce(&mut ClientState)) {
    STATE.with(|s| {
        if let Some(state) = s.borrow_mut().as_mut() {
            f(state);
        }
    });
}

async fn init_state(window: Arc<Window>, settings: Settings) -> Option<ClientState> {
    let game = match GameState::new(&settings) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Failed to build level: {e}");
            return None;
        }
    };
    let renderer = match Renderer::new(window, &game.level, &settings).await {
        Ok(renderer) => renderer,
        Err(e) => {
            log::error!("Failed to initialise renderer: {e}");
            return None;
        }
    };
    Some(ClientState {
        renderer,
        game,
        input: InputState::new(),
        hud: Hud::new(),
    })
}

#[derive(Default)]
struct App {
    window: Option<Arc<Window>>,
}

impl App {
    #[cfg(target_arch = "wasm32")]
    fn attach_canvas(window: &Window) {
        use winit::platform::web::WindowExtWebSys;
        let Some(canvas) = window.canvas() else {
            log::error!("Window has no canvas");
            return;
        };
        let Some(web_window) = web_sys::window() else {
            return;
        };
        let dpr = web_window.device_pixel_ratio();
        let dimension = |value: Result<JsValue, JsValue>| {
            (value.ok().and_then(|v| v.as_f64()).unwrap_or(1.0) * dpr) as u32
        };
        canvas.set_width(dimension(web_window.inner_width()));
        canvas.set_height(dimension(web_window.inner_height()));
        canvas
            .style()
            .set_css_text("width: 100%; height: 100%; display: block;");

        let appended = web_window
            .document()
            .and_then(|doc| doc.get_element_by_id("wasm-container"))
            .and_then(|container| container.append_child(&canvas).ok());
        if appended.is_none() {
            log::error!("Couldn't append canvas to #wasm-container");
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn grab_cursor(&self, grab: bool) {
        let document = web_sys::window().and_then(|w| w.document());
        if grab {
            if let Some(canvas) = document
                .and_then(|d| d.get_element_by_id("wasm-container"))
                .and_then(|c| c.first_element_child())
            {
                canvas.request_pointer_lock();
            }
        } else if let Some(d) = document {
            d.exit_pointer_lock();
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn grab_cursor(&self, grab: bool) {
        use winit::window::CursorGrabMode;
        let Some(window) = &self.window else { return };
        let mode = if grab {
            CursorGrabMode::Locked
        } else {
            CursorGrabMode::None
        };
        if let Err(e) = window
            .set_cursor_grab(mode)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        {
            log::warn!("Cursor grab failed: {e}");
        }
        window.set_cursor_visible(!grab);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop
            .create_window(Window::default_attributes().with_title("Mario Platformer"))
        {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let settings = Settings::from_environment();
        log::info!("Starting with {settings:?}");

        #[cfg(target_arch = "wasm32")]
        {
            Self::attach_canvas(&window);
            wasm_bindgen_futures::spawn_local(async move {
                let state = init_state(window.clone(), settings).await;
                let ready = state.is_some();
                STATE.with(|s| *s.borrow_mut() = state);
                if ready {
                    window.request_redraw();
                }
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let state = pollster::block_on(init_state(window.clone(), settings));
            if state.is_none() {
                event_loop.exit();
                return;
            }
            STATE.with(|s| *s.borrow_mut() = state);
            window.request_redraw();
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        let DeviceEvent::MouseMotion { delta } = event else {
            return;
        };
        with_state(|state| {
            if state.input.cursor_grabbed {
                state
                    .input
                    .handle_mouse_move(delta.0 as f32, delta.1 as f32);
            }
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                with_state(|state| state.renderer.resize(size.width, size.height));
            }
            WindowEvent::Focused(false) => {
                with_state(|state| {
                    state.input.release_all();
                    state.input.cursor_grabbed = false;
                });
                self.grab_cursor(false);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                let mut release_cursor = false;
                with_state(|state| match event.state {
                    ElementState::Pressed if key == KeyCode::Escape => {
                        state.input.cursor_grabbed = false;
                        release_cursor = true;
                    }
                    ElementState::Pressed => state.input.handle_key_press(key),
                    ElementState::Released => state.input.handle_key_release(key),
                });
                if release_cursor {
                    self.grab_cursor(false);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.grab_cursor(true);
                with_state(|state| state.input.cursor_grabbed = true);
            }
            WindowEvent::RedrawRequested => {
                with_state(|state| {
                    state.game.update(&mut state.input);
                    state.hud.update(state.game.score);

                    match state.renderer.render_frame(&state.game) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let (w, h) = (state.renderer.width(), state.renderer.height());
                            state.renderer.resize(w, h);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => log::error!("Render error: {e:?}"),
                    }
                    state.renderer.request_redraw();
                });
            }
            _ => {}
        }
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(start))]
pub fn run() {
    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(|info| {
            web_sys::console::error_1(&info.to_string().into())
        }));
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&e.to_string().into());
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            return;
        }
    };
    if let Err(e) = event_loop.run_app(&mut App::default()) {
        log::error!("Event loop terminated: {e}");
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    run();
}
