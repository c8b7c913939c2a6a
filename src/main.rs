// GPU-resident Game of Life: compute dispatches advance the grid on a fixed
// timestep while the render pass redraws at whatever rate the display runs.

use std::sync::Arc;

use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
};

mod config;
mod error;
mod life;
mod pacer;
mod pingpong;
mod shader;

use config::SimConfig;
use error::EngineError;
use life::LifeState;

fn main() {
    use env_logger::Env;
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        eprintln!("Fatal error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = SimConfig::from_env();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(event_loop.create_window(
        winit::window::WindowAttributes::default()
            .with_title("Game of Life")
            .with_inner_size(winit::dpi::PhysicalSize::new(800, 800)),
    )?);

    let mut state = pollster::block_on(LifeState::new(window.clone(), config))?;

    event_loop.run(move |event, control_flow| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => control_flow.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => control_flow.exit(),
            WindowEvent::Resized(physical_size) => {
                state.resize(physical_size.width, physical_size.height);
            }
            WindowEvent::RedrawRequested => match state.render_frame() {
                Ok(()) => {}
                Err(EngineError::Surface(
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                )) => state.reconfigure_surface(),
                Err(EngineError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                    log::error!("surface out of memory, exiting");
                    control_flow.exit();
                }
                Err(e) => log::error!("frame failed: {e}"),
            },
            _ => {}
        },
        Event::AboutToWait => {
            window.request_redraw();
        }
        _ => {}
    })?;

    Ok(())
}
