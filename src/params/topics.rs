//! Topic construction
//!
//! Pure functions: a topic is fully determined by the entry's kind, its
//! group's topic path, its key and the registry configuration. Shapes:
//!
//! ```text
//! parameter            params/<location>/<device>/[group/]key
//! parameter (location) params/<location>/[group/]key
//! locdata              locdata/<location>/[group/]key
//! extdata              [group/]key                      (verbatim, no root)
//! signal               params/<location>/<device>/[group/]key
//! command / ota        system/<location>/<device>/key
//! confirmation         confirm/<location>[/<device>]/[group/]key
//! wildcard             params/<location>/<device>/#
//! ```

use heapless::String;

use super::entry::ParamEntry;
use super::groups::GroupTree;
use super::{ParamKind, RegistryConfig, MAX_TOPIC_LEN};
use crate::error::ParamsError;

/// Owned topic string
pub type TopicString = String<MAX_TOPIC_LEN>;

/// Join non-empty segments with '/'
fn join(segments: &[&str]) -> Result<TopicString, ParamsError> {
    let mut out = TopicString::new();
    for segment in segments.iter().filter(|s| !s.is_empty()) {
        if !out.is_empty() {
            out.push('/').map_err(|_| ParamsError::TopicBuild)?;
        }
        out.push_str(segment).map_err(|_| ParamsError::TopicBuild)?;
    }
    if out.is_empty() {
        return Err(ParamsError::TopicBuild);
    }
    Ok(out)
}

/// Subscribe topic for an entry
pub fn subscribe_topic(
    cfg: &RegistryConfig,
    groups: &GroupTree,
    entry: &ParamEntry,
) -> Result<TopicString, ParamsError> {
    let group = groups.topic_of(entry.group);
    match entry.kind {
        ParamKind::Parameter
        | ParamKind::ParameterOnline
        | ParamKind::Signal
        | ParamKind::SignalAutoClear => {
            join(&[cfg.params_root, cfg.location, cfg.device, group, entry.key])
        }
        ParamKind::ParameterLocation => join(&[cfg.params_root, cfg.location, group, entry.key]),
        ParamKind::LocDataOnline | ParamKind::LocDataStored => {
            join(&[cfg.locdata_root, cfg.location, group, entry.key])
        }
        ParamKind::ExtDataOnline | ParamKind::ExtDataStored => join(&[group, entry.key]),
        ParamKind::Command | ParamKind::Ota => {
            join(&[cfg.system_root, cfg.location, cfg.device, entry.key])
        }
    }
}

/// Confirmation (publish) topic for an entry
///
/// Only parameter kinds confirm; the confirm root replaces the parameter
/// root, everything else keeps the subscribe shape.
pub fn confirm_topic(
    cfg: &RegistryConfig,
    groups: &GroupTree,
    entry: &ParamEntry,
) -> Result<TopicString, ParamsError> {
    let group = groups.topic_of(entry.group);
    match entry.kind {
        ParamKind::Parameter | ParamKind::ParameterOnline => {
            join(&[cfg.confirm_root, cfg.location, cfg.device, group, entry.key])
        }
        ParamKind::ParameterLocation => join(&[cfg.confirm_root, cfg.location, group, entry.key]),
        _ => Err(ParamsError::TopicBuild),
    }
}

/// Shared wildcard subscription covering all device parameters
pub fn wildcard_topic(cfg: &RegistryConfig) -> Result<TopicString, ParamsError> {
    join(&[cfg.params_root, cfg.location, cfg.device, "#"])
}

/// Exact, case-insensitive topic match
pub fn topic_matches(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
