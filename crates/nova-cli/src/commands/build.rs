//! `nova build`: compile the library into a static archive

use super::Session;
use anyhow::Result;
use nova_build::{ArtifactKind, Flow};

pub fn run(session: &Session) -> Result<i32> {
    let builder = session.builder()?;
    let request = session.request(
        Flow::Build,
        builder.backend().kind(),
        ArtifactKind::StaticLibrary,
        Vec::new(),
    )?;
    session.build(&builder, &request)?;
    Ok(0)
}
