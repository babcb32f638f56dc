//! Topic derivation preview. No network access.

use serde::Serialize;
use tabled::Tabled;

use pushsync_core::{Topic, TopicSet};

use crate::cli::{GlobalOpts, TopicsArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct TopicEntry {
    community: String,
    topic: Topic,
}

#[derive(Tabled)]
struct TopicRow {
    #[tabled(rename = "Community")]
    community: String,
    #[tabled(rename = "Topic")]
    topic: String,
}

pub fn handle(args: TopicsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ids = util::community_ids(args.communities);
    let topics = TopicSet::from_communities(&ids);

    // Walk the communities in topic order so each row pairs its source id
    // with the derived name. Duplicates and blanks were dropped above.
    let mut entries: Vec<TopicEntry> = ids
        .iter()
        .map(|id| TopicEntry {
            community: id.to_string(),
            topic: Topic::for_community(id),
        })
        .filter(|e| topics.contains(e.topic.as_str()))
        .collect();
    entries.sort_by(|a, b| a.topic.cmp(&b.topic));
    entries.dedup_by(|a, b| a.topic == b.topic);

    let out = output::render_list(
        global.output,
        &entries,
        |e| TopicRow {
            community: e.community.clone(),
            topic: e.topic.to_string(),
        },
        |e| e.topic.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
