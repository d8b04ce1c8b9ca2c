#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod core;

use std::path::PathBuf;
use std::sync::Arc;

use tauri::{DragDropEvent, Manager, WindowEvent};

use crate::core::app::{emit_drag_highlight, AppRuntime};
use crate::core::config::{load_api_key, load_config, AppConfig};
use crate::core::state::StateEvent;

#[derive(Clone)]
pub(crate) struct SharedRuntime(pub Arc<AppRuntime>);

#[tauri::command]
async fn get_config(state: tauri::State<'_, SharedRuntime>) -> Result<AppConfig, String> {
    Ok(state.0.get_config().await)
}

#[tauri::command]
async fn get_state(state: tauri::State<'_, SharedRuntime>) -> Result<StateEvent, String> {
    Ok(state.0.state().await)
}

#[tauri::command]
async fn pick_image(
    app: tauri::AppHandle,
    state: tauri::State<'_, SharedRuntime>,
) -> Result<(), String> {
    let picked = rfd::AsyncFileDialog::new()
        .add_filter(
            "Images",
            &["png", "jpg", "jpeg", "gif", "webp", "bmp", "avif", "tif", "tiff"],
        )
        .pick_file()
        .await;

    if let Some(file) = picked {
        state
            .0
            .select_image_path(app, file.path().to_path_buf())
            .await;
    }
    Ok(())
}

#[tauri::command]
async fn select_image_path(
    app: tauri::AppHandle,
    state: tauri::State<'_, SharedRuntime>,
    path: PathBuf,
) -> Result<(), String> {
    state.0.select_image_path(app, path).await;
    Ok(())
}

#[tauri::command]
async fn select_image_data(
    app: tauri::AppHandle,
    state: tauri::State<'_, SharedRuntime>,
    data_url: String,
    mime_type: Option<String>,
) -> Result<(), String> {
    state.0.select_image_data(app, data_url, mime_type).await;
    Ok(())
}

#[tauri::command]
async fn reset(app: tauri::AppHandle, state: tauri::State<'_, SharedRuntime>) -> Result<(), String> {
    state.0.reset(&app).await;
    Ok(())
}

#[tauri::command]
async fn copy_alt_text(
    app: tauri::AppHandle,
    state: tauri::State<'_, SharedRuntime>,
) -> Result<(), String> {
    state
        .0
        .copy_alt_text(app)
        .await
        .map_err(|e| e.user_message())
}

#[tokio::main]
async fn main() {
    init_tracing();

    // Refuse to start without the credential; no window is created.
    let api_key = match load_api_key() {
        Ok(key) => key,
        Err(err) => {
            tracing::error!("refusing to start: {}", err.details());
            std::process::exit(1);
        }
    };

    let config = load_config().unwrap_or_default();
    let runtime = SharedRuntime(Arc::new(AppRuntime::new(config, api_key)));

    tauri::Builder::default()
        .manage(runtime)
        .invoke_handler(tauri::generate_handler![
            get_config,
            get_state,
            pick_image,
            select_image_path,
            select_image_data,
            reset,
            copy_alt_text
        ])
        .setup(|app| {
            if let Some(win) = app.get_webview_window("main") {
                let app_handle = app.handle().clone();
                win.on_window_event(move |event| {
                    if let WindowEvent::DragDrop(drag) = event {
                        handle_drag_drop(&app_handle, drag);
                    }
                });
            }
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

fn handle_drag_drop(app: &tauri::AppHandle, event: &DragDropEvent) {
    match event {
        DragDropEvent::Enter { .. } | DragDropEvent::Over { .. } => emit_drag_highlight(app, true),
        DragDropEvent::Leave => emit_drag_highlight(app, false),
        DragDropEvent::Drop { paths, .. } => {
            emit_drag_highlight(app, false);
            // No type or size validation here; the selection is forwarded
            // unconditionally.
            if let Some(path) = paths.first().cloned() {
                let app = app.clone();
                tauri::async_runtime::spawn(async move {
                    let runtime = app.state::<SharedRuntime>().0.clone();
                    runtime.select_image_path(app.clone(), path).await;
                });
            }
        }
        _ => {}
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("alttext=info,tauri=info")),
        )
        .try_init();
}
