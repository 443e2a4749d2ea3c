// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated user profile as returned by `/auth/login/` and `/auth/me/`.

use serde::{Deserialize, Serialize};

/// The authenticated user. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub usuario_id: i64,
    pub nombre_usuario: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default = "default_true")]
    pub es_activo: bool,
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Identity {
    /// Display name, falling back to the username when no name is set.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.nombre, self.apellido);
        let full = full.trim();
        if full.is_empty() {
            self.nombre_usuario.clone()
        } else {
            full.to_owned()
        }
    }

    /// True if the user holds any of `roles` (case-insensitive).
    ///
    /// `admin` and `administrador` are treated as the same role.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        if self.roles.is_empty() {
            return false;
        }
        let held: Vec<String> = self.roles.iter().map(|r| r.to_lowercase()).collect();
        roles
            .iter()
            .flat_map(|role| role_synonyms(role))
            .any(|candidate| held.iter().any(|h| *h == candidate))
    }
}

fn role_synonyms(role: &str) -> Vec<String> {
    let normalized = role.to_lowercase();
    match normalized.as_str() {
        "admin" | "administrador" => vec!["admin".to_owned(), "administrador".to_owned()],
        _ => vec![normalized],
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
