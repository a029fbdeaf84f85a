use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// List the model registry for selection UIs.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelEntry>> {
    let models = state
        .registry
        .all()
        .iter()
        .map(|m| ModelEntry {
            id: m.id.clone(),
            name: m.display_name.clone(),
            selected: m.selected_by_default,
        })
        .collect();

    Json(models)
}
