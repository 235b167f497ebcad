// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Home-set discovery across delegated and group principals.

use std::collections::{HashSet, VecDeque};

use crate::client::DavClient;
use crate::error::DavError;
use crate::request::{Prop, PropFindRequest};
use crate::types::{HomeSets, Href};

/// Upper bound on principals visited in one discovery.
const MAX_PRINCIPALS: usize = 32;

/// Breadth-first queue of principals with a visited set.
///
/// A principal is visited at most once, so cycles between group and proxy
/// principals terminate.
#[derive(Debug, Default)]
struct Worklist {
    queue: VecDeque<Href>,
    seen: HashSet<String>,
}

impl Worklist {
    fn push(&mut self, href: Href) {
        let key = href.as_str().trim_end_matches('/').to_string();
        if self.seen.insert(key) {
            self.queue.push_back(href);
        }
    }

    fn pop(&mut self) -> Option<Href> {
        self.queue.pop_front()
    }
}

fn push_unique(target: &mut Vec<Href>, href: Href) {
    if !target.iter().any(|h| h.same_path(&href)) {
        target.push(href);
    }
}

impl DavClient {
    /// Collects calendar and address book home sets reachable from a principal.
    ///
    /// Principals listed in `calendar-proxy-read-for`,
    /// `calendar-proxy-write-for` and `group-membership` are visited too.
    /// Failures on principals other than the starting one are logged and
    /// skipped, since delegated principals are often not readable.
    ///
    /// # Errors
    ///
    /// Returns an error if the starting principal can't be queried.
    #[tracing::instrument(skip(self))]
    pub async fn discover_home_sets(&self, principal: &Href) -> Result<HomeSets, DavError> {
        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::CalendarHomeSet)
            .add_property(Prop::AddressbookHomeSet)
            .add_property(Prop::CalendarProxyReadFor)
            .add_property(Prop::CalendarProxyWriteFor)
            .add_property(Prop::GroupMembership);

        let mut worklist = Worklist::default();
        worklist.push(principal.clone());
        let mut result = HomeSets::default();

        while let Some(current) = worklist.pop() {
            if result.principals.len() >= MAX_PRINCIPALS {
                tracing::warn!(limit = MAX_PRINCIPALS, "principal limit reached");
                break;
            }
            result.principals.push(current.clone());

            let multistatus = match self.propfind(&current, &propfind, "0").await {
                Ok(multistatus) => multistatus,
                Err(err) if result.principals.len() > 1 => {
                    tracing::warn!(href = %current, %err, "skipping unreadable principal");
                    continue;
                }
                Err(err) => return Err(err),
            };

            for response in multistatus.responses {
                let props = response.found_props();
                for home in props.calendar_home_set {
                    push_unique(&mut result.calendar_homes, home);
                }
                for home in props.addressbook_home_set {
                    push_unique(&mut result.addressbook_homes, home);
                }
                for next in props.proxy_for.into_iter().chain(props.group_membership) {
                    worklist.push(next);
                }
            }
        }

        tracing::debug!(
            principals = result.principals.len(),
            calendar_homes = result.calendar_homes.len(),
            addressbook_homes = result.addressbook_homes.len(),
            "home-set discovery finished"
        );
        Ok(result)
    }
}
