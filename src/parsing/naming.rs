//! Deterministic channel-name disambiguation.
//!
//! Files in the wild reuse channel names across (and sometimes within)
//! data groups. Names are made unique in resolution order: a short name
//! already assigned in the current data group gets the `_<dg>_<cg>_<cn>`
//! suffix (the pattern unsorted files rely on), a resolved name already
//! assigned anywhere gets `_<dg>`, everything else is kept as is.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub name: String,
    /// Segment between the first and second backslash of the raw name.
    pub device: Option<String>,
}

#[derive(Debug, Default)]
pub struct NameResolver {
    filter_long_names: bool,
    global: HashSet<String>,
    per_group: HashSet<String>,
}

impl NameResolver {
    pub fn new(filter_long_names: bool) -> Self {
        NameResolver {
            filter_long_names,
            global: HashSet::new(),
            per_group: HashSet::new(),
        }
    }

    /// Resets the per-data-group name set. Call when entering a new DG.
    pub fn begin_data_group(&mut self) {
        self.per_group.clear();
    }

    /// Assigns the final unique name for one channel.
    ///
    /// The ASAM long name wins over the short name only when it is
    /// strictly longer. The chosen name is split at its first backslash
    /// (the following segment is the device name) and optionally reduced
    /// to its last dot-delimited segment.
    pub fn resolve(
        &mut self,
        short_name: &str,
        long_name: Option<&str>,
        dg: usize,
        cg: usize,
        cn: usize,
    ) -> ResolvedName {
        let chosen = match long_name {
            Some(long) if long.len() > short_name.len() => long,
            _ => short_name,
        };

        let mut segments = chosen.split('\\');
        let mut resolved = segments.next().unwrap_or_default().to_string();
        let device = segments.next().map(str::to_string);

        if self.filter_long_names {
            if let Some(dot) = resolved.rfind('.') {
                resolved = resolved[dot + 1..].to_string();
            }
        }

        let name = if self.per_group.contains(short_name) {
            format!("{short_name}_{dg}_{cg}_{cn}")
        } else if self.global.contains(&resolved) {
            format!("{resolved}_{dg}")
        } else {
            resolved
        };

        self.per_group.insert(name.clone());
        self.global.insert(name.clone());

        ResolvedName { name, device }
    }
}
