//! Compiles `shaders/*.{vert,frag}` to SPIR-V in `OUT_DIR`.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use shaderc::{
    CompileOptions, Compiler, EnvVersion, OptimizationLevel, ShaderKind, SpirvVersion, TargetEnv,
};

const SHADER_DIR: &str = "shaders";

/// Source file and stage. Output is `<name with '.' as '_'>.spv`.
const SHADERS: [(&str, ShaderKind); 2] = [
    ("sprite.vert", ShaderKind::Vertex),
    ("sprite.frag", ShaderKind::Fragment),
];

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={SHADER_DIR}/");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let compiler = Compiler::new().ok_or("shaderc compiler unavailable")?;
    let mut options = CompileOptions::new().ok_or("shaderc options unavailable")?;
    options.set_target_env(TargetEnv::Vulkan, EnvVersion::Vulkan1_3 as u32);
    options.set_target_spirv(SpirvVersion::V1_6);
    options.set_optimization_level(OptimizationLevel::Performance);

    for (name, kind) in SHADERS {
        let source_path = Path::new(SHADER_DIR).join(name);
        let source = fs::read_to_string(&source_path)
            .map_err(|e| format!("reading {}: {e}", source_path.display()))?;
        let artifact = compiler
            .compile_into_spirv(&source, kind, name, "main", Some(&options))
            .map_err(|e| format!("compiling {name}: {e}"))?;
        if artifact.get_num_warnings() > 0 {
            println!("cargo:warning={name}: {}", artifact.get_warning_messages());
        }

        let spv = out_dir.join(format!("{}.spv", name.replace('.', "_")));
        fs::write(&spv, artifact.as_binary_u8())?;
    }
    Ok(())
}
