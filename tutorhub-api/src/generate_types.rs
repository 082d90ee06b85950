//! TypeScript type generation module.
//!
//! This module exports TypeScript type definitions for all the structs
//! annotated with `#[ts(export)]`. When this file is compiled (typically
//! during testing), it generates .ts files in the specified output directory.

#[cfg(test)]
mod tests {
    use std::{env, path::Path};

    use ts_rs::TS;

    #[test]
    fn generate_typescript_types() {
        // Output directory in order of preference:
        // 1. Environment variable TUTORHUB_TS_OUTPUT_DIR
        // 2. ../ts-bindings (fallback)
        let output_dir_str = env::var("TUTORHUB_TS_OUTPUT_DIR")
            .unwrap_or_else(|_| "../ts-bindings".to_string());

        let output_dir = Path::new(&output_dir_str);

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).expect("Failed to create output directory");
        }

        // Clean up old TypeScript files so removed or renamed Rust types
        // don't leave orphaned definitions behind.
        for entry in std::fs::read_dir(output_dir).expect("Failed to read output directory") {
            let entry = entry.expect("Failed to read directory entry");
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("ts") {
                std::fs::remove_file(&path).unwrap_or_else(|_| panic!("Failed to remove {:?}", path));
            }
        }

        unsafe {
            env::set_var("TS_RS_EXPORT_DIR", output_dir);
        }

        crate::models::User::export_all().expect("export User types");
        crate::models::UserInput::export_all().expect("export UserInput types");
        crate::models::Session::export_all().expect("export Session types");
        crate::models::SessionInput::export_all().expect("export SessionInput types");
        crate::models::SessionStatus::export_all().expect("export SessionStatus types");
        crate::models::Cancellation::export_all().expect("export Cancellation types");
        crate::models::BookingRequest::export_all().expect("export BookingRequest types");
        crate::models::BookingRequestInput::export_all().expect("export BookingRequestInput types");
        crate::models::RequestStatus::export_all().expect("export RequestStatus types");
        crate::models::Acceptance::export_all().expect("export Acceptance types");
        crate::models::Rejection::export_all().expect("export Rejection types");
        crate::models::TokenLedgerEntry::export_all().expect("export TokenLedgerEntry types");
        crate::models::TokenMutation::export_all().expect("export TokenMutation types");
        crate::api::ErrorResponse::export_all().expect("export ErrorResponse types");
        crate::api::token::TokenAccount::export_all().expect("export TokenAccount types");
    }
}
