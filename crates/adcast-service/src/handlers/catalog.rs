//! Static catalog handlers: platforms, export formats, and credit packages.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use adcast_core::{credit_packages, CreditPackage};
use adcast_export::{EXPORT_FORMATS, KNOWN_PLATFORMS};

use crate::state::AppState;

/// One plannable platform.
#[derive(Debug, Serialize)]
pub struct PlatformInfo {
    /// Platform name.
    pub name: String,
    /// Whether campaigns can be exported to it.
    pub supported: bool,
}

/// Platform list response.
#[derive(Debug, Serialize)]
pub struct PlatformsResponse {
    /// Every plannable platform.
    pub platforms: Vec<PlatformInfo>,
    /// Formats a campaign can be downloaded in.
    pub export_formats: Vec<&'static str>,
}

/// List plannable platforms and whether each has an export adapter.
pub async fn platforms(State(state): State<Arc<AppState>>) -> Json<PlatformsResponse> {
    let registered = state.workflow.providers();

    let mut platforms: Vec<PlatformInfo> = KNOWN_PLATFORMS
        .iter()
        .map(|name| PlatformInfo {
            name: (*name).to_string(),
            supported: registered.iter().any(|p| p.as_str() == *name),
        })
        .collect();
    for provider in &registered {
        if !KNOWN_PLATFORMS.contains(&provider.as_str()) {
            platforms.push(PlatformInfo {
                name: provider.as_str().to_string(),
                supported: true,
            });
        }
    }

    Json(PlatformsResponse {
        platforms,
        export_formats: EXPORT_FORMATS.to_vec(),
    })
}

/// Export format list response.
#[derive(Debug, Serialize)]
pub struct ExportFormatsResponse {
    /// Formats a campaign can be downloaded in.
    pub formats: Vec<&'static str>,
}

/// List supported export formats.
pub async fn export_formats() -> Json<ExportFormatsResponse> {
    Json(ExportFormatsResponse {
        formats: EXPORT_FORMATS.to_vec(),
    })
}

/// Credit package list response.
#[derive(Debug, Serialize)]
pub struct CreditPackagesResponse {
    /// Packages on sale, smallest first.
    pub packages: Vec<CreditPackage>,
}

/// List purchasable credit packages.
pub async fn list_credit_packages() -> Json<CreditPackagesResponse> {
    Json(CreditPackagesResponse {
        packages: credit_packages(),
    })
}
