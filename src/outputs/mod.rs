//! Output generation for the `fetch` command.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── all.json
//!     └── cultura.json
//! ```

pub mod json;
