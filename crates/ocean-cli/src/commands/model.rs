//! Identity, asset and reference command handlers

use anyhow::Result;

use ocean_core::{models, Store};

use crate::output::Output;

pub fn identity(
    store: &mut Store,
    name: String,
    nametype: Option<String>,
    id: Option<String>,
    output: &Output,
) -> Result<()> {
    let id = store.identity(Some(&name), nametype.as_deref(), id.as_deref())?;
    output.created(models::IDENTITY, &id);
    Ok(())
}

pub fn asset(
    store: &mut Store,
    title: String,
    titletype: Option<String>,
    id: Option<String>,
    output: &Output,
) -> Result<()> {
    let id = store.asset(Some(&title), titletype.as_deref(), id.as_deref())?;
    output.created(models::ASSET, &id);
    Ok(())
}

pub fn reference(
    store: &mut Store,
    namespace: String,
    code: String,
    target: Option<String>,
    output: &Output,
) -> Result<()> {
    let id = store.reference(&namespace, &code, target.as_deref())?;
    output.created(models::REFERENCE, &id);
    Ok(())
}
