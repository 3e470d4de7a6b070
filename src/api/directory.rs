use tracing::{debug, info, warn};

use crate::domain::Coordinate;
use crate::error::Result;

/// What the directory says about a single business id
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookupOutcome {
    /// Listed, with a position if the directory has one
    Found(Option<Coordinate>),
    /// The id definitively does not exist
    NotFound,
    /// The API will not serve this id right now; it may still exist
    Unavailable,
}

/// Read access to a business directory.
///
/// Implementations do no retrying of their own; transient failures surface
/// as errors.
pub trait DirectoryApi {
    fn lookup(&self, id: &str) -> Result<LookupOutcome>;

    /// Secondary existence check used when `lookup` reports `Unavailable`
    fn storefront_exists(&self, id: &str) -> Result<bool>;
}

/// Resolution state of one candidate id
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeState {
    Probing,
    ConfirmedPresent(Option<Coordinate>),
    ConfirmedAbsent,
}

/// Lowercase, ASCII alphanumerics only, runs of anything else become `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' {
            continue;
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Directory id of the `index`-th (1-based) location of a chain in an area.
///
/// The first location carries no numeric suffix: `starbucks-new-york`,
/// then `starbucks-new-york-2`, `starbucks-new-york-3`, ...
pub fn business_id(chain: &str, area: &str, index: u32) -> String {
    let base = format!("{}-{}", slugify(chain), slugify(area));
    if index <= 1 {
        base
    } else {
        format!("{base}-{index}")
    }
}

/// Walks a chain's ids in sequence until the directory confirms one absent
pub struct Enumerator<'a, D: DirectoryApi + ?Sized> {
    api: &'a D,
    max_consecutive_unavailable: u32,
}

impl<'a, D: DirectoryApi + ?Sized> Enumerator<'a, D> {
    pub fn new(api: &'a D) -> Self {
        Self {
            api,
            max_consecutive_unavailable: u32::MAX,
        }
    }

    pub fn with_max_consecutive_unavailable(mut self, limit: u32) -> Self {
        self.max_consecutive_unavailable = limit;
        self
    }

    /// Take one id from `Probing` to a confirmed state.
    ///
    /// `Unavailable` never ends the walk by itself: the storefront check
    /// decides whether the id is present or absent.
    pub fn resolve(&self, id: &str) -> Result<ProbeState> {
        let state = match self.api.lookup(id)? {
            LookupOutcome::Found(position) => ProbeState::ConfirmedPresent(position),
            LookupOutcome::NotFound => ProbeState::ConfirmedAbsent,
            LookupOutcome::Unavailable => {
                if self.api.storefront_exists(id)? {
                    debug!(id, "unavailable in API but storefront exists");
                    ProbeState::ConfirmedPresent(None)
                } else {
                    ProbeState::ConfirmedAbsent
                }
            }
        };
        Ok(state)
    }

    /// Every location of `chain` in `area` that has a known position.
    ///
    /// Best effort: ids after the first confirmed-absent one are never
    /// tried, so gaps in the directory's numbering truncate the result.
    /// A directory error after at least one location was found ends the
    /// walk with what was collected; an error before that is returned.
    pub fn fetch_locations(&self, chain: &str, area: &str) -> Result<Vec<Coordinate>> {
        let mut locations = Vec::new();
        let mut index = 1;
        let mut consecutive_unavailable = 0;
        let mut state = ProbeState::Probing;

        loop {
            state = match state {
                ProbeState::Probing => match self.resolve(&business_id(chain, area, index)) {
                    Ok(next) => next,
                    Err(e) if !locations.is_empty() => {
                        warn!(
                            chain,
                            area,
                            index,
                            found = locations.len(),
                            error = %e,
                            "directory error, keeping locations found so far"
                        );
                        break;
                    }
                    Err(e) => return Err(e),
                },
                ProbeState::ConfirmedPresent(Some(position)) => {
                    locations.push(position);
                    consecutive_unavailable = 0;
                    index += 1;
                    ProbeState::Probing
                }
                ProbeState::ConfirmedPresent(None) => {
                    consecutive_unavailable += 1;
                    if consecutive_unavailable >= self.max_consecutive_unavailable {
                        warn!(
                            chain,
                            area,
                            skipped = consecutive_unavailable,
                            "too many unavailable ids in a row, stopping"
                        );
                        break;
                    }
                    index += 1;
                    ProbeState::Probing
                }
                ProbeState::ConfirmedAbsent => break,
            };
        }

        info!(chain, area, found = locations.len(), checked = index, "enumeration finished");
        Ok(locations)
    }
}
