// Build script for flutter_rust_bridge code generation
//
// flutter_rust_bridge v2 code generation is run via the CLI tool:
//   flutter_rust_bridge_codegen generate
//
// The generated Dart bindings wrap the free functions in src/api.rs.

fn main() {
    // Tell cargo to rerun this build script if api.rs changes
    println!("cargo:rerun-if-changed=src/api.rs");
}
