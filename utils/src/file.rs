use std::fs;
use std::io;
use std::path::Path;

use dbx_defs::{ArtifactKind, ConfigArtifacts};
use log::{debug, info};

/// Writes all artifacts into `dir`, creating it (and parents) when absent.
pub fn write_artifacts(artifacts: &ConfigArtifacts, dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    for (kind, content) in artifacts.iter() {
        let path = dir.join(kind.file_name());
        fs::write(&path, content)?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
    }

    info!(
        "Wrote {} configuration files to {}",
        ArtifactKind::ALL.len(),
        dir.display()
    );
    Ok(())
}

pub fn read_artifacts(dir: &Path) -> io::Result<ConfigArtifacts> {
    let read = |kind: ArtifactKind| fs::read_to_string(dir.join(kind.file_name()));

    Ok(ConfigArtifacts {
        provider: read(ArtifactKind::Provider)?,
        main: read(ArtifactKind::Main)?,
        variables: read(ArtifactKind::Variables)?,
        outputs: read(ArtifactKind::Outputs)?,
        variable_values: read(ArtifactKind::VariableValues)?,
    })
}
