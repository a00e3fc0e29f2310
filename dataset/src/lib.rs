use std::fs::File;
use std::path::{Path, PathBuf};

use subweave_core::{
    CommentRecord, CommunityStatsRecord, CoreError, DatasetError, InterconnectionRecord,
    PostRecord,
};
use tracing::info;


/// Column order of the posts dataset. Pinned here so the published header
/// text never drifts with struct field renames.
pub const POSTS_COLUMNS: &[&str] = &[
    "post_id",
    "title",
    "author",
    "author_fullname",
    "subreddit",
    "created_utc",
    "score",
    "upvote_ratio",
    "num_comments",
    "selftext",
    "url",
    "permalink",
    "link_karma",
    "comment_karma",
    "is_original_content",
    "stickied",
    "locked",
    "archived",
    "crosspost_parent",
    "is_crosspost",
];

/// Column order of the comments dataset.
pub const COMMENTS_COLUMNS: &[&str] = &[
    "comment_id",
    "post_id",
    "parent_id",
    "author",
    "author_fullname",
    "subreddit",
    "body",
    "score",
    "created_utc",
    "edited",
    "is_submitter",
    "permalink",
    "depth",
    "link_karma",
    "comment_karma",
    "parent_author",
];

/// Column order of the interconnections dataset.
pub const INTERCONNECTIONS_COLUMNS: &[&str] = &[
    "user",
    "community1",
    "community2",
    "interaction_type",
    "interaction_count",
    "first_interaction",
    "last_interaction",
];

/// Column order of the community stats dataset.
pub const COMMUNITY_STATS_COLUMNS: &[&str] = &[
    "community",
    "total_users",
    "multi_community_users",
    "interconnection_ratio",
    "connected_communities_count",
    "connected_communities",
];

/// Locations of the four CSV files produced by one collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPaths {
    pub posts: PathBuf,
    pub comments: PathBuf,
    pub interconnections: PathBuf,
    pub community_stats: PathBuf,
}

impl DatasetPaths {
    pub fn new(output_dir: &Path, base_name: &str) -> Self {
        Self {
            posts: output_dir.join(format!("{}_posts.csv", base_name)),
            comments: output_dir.join(format!("{}_comments.csv", base_name)),
            interconnections: output_dir.join(format!("{}_interconnections.csv", base_name)),
            community_stats: output_dir.join(format!("{}_community_stats.csv", base_name)),
        }
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        vec![
            self.posts.clone(),
            self.comments.clone(),
            self.interconnections.clone(),
            self.community_stats.clone(),
        ]
    }
}

/// Streams posts and comments to disk as they arrive and writes the two
/// derived datasets when the run finishes.
///
/// Every appended row is flushed immediately, so an interrupted run keeps
/// everything collected up to the failing row.
pub struct DatasetWriter {
    paths: DatasetPaths,
    posts: csv::Writer<File>,
    comments: csv::Writer<File>,
    posts_written: u64,
    comments_written: u64,
}

impl DatasetWriter {
    /// Creates the output directory and all four CSV files with their
    /// header rows. The interconnections and stats files are rewritten by
    /// [`DatasetWriter::finish`].
    pub fn create(output_dir: &Path, base_name: &str) -> Result<Self, CoreError> {
        std::fs::create_dir_all(output_dir)?;
        let paths = DatasetPaths::new(output_dir, base_name);

        let posts = create_sink(&paths.posts, "posts", POSTS_COLUMNS)?;
        let comments = create_sink(&paths.comments, "comments", COMMENTS_COLUMNS)?;
        create_sink(
            &paths.interconnections,
            "interconnections",
            INTERCONNECTIONS_COLUMNS,
        )?;
        create_sink(
            &paths.community_stats,
            "community_stats",
            COMMUNITY_STATS_COLUMNS,
        )?;

        info!(
            "Created dataset files under {} with base name {}",
            output_dir.display(),
            base_name
        );

        Ok(Self {
            paths,
            posts,
            comments,
            posts_written: 0,
            comments_written: 0,
        })
    }

    pub fn append_post(&mut self, record: &PostRecord) -> Result<(), CoreError> {
        self.posts.serialize(record).map_err(DatasetError::Csv)?;
        flush_sink(&mut self.posts, "posts")?;
        self.posts_written += 1;
        Ok(())
    }

    pub fn append_comment(&mut self, record: &CommentRecord) -> Result<(), CoreError> {
        self.comments.serialize(record).map_err(DatasetError::Csv)?;
        flush_sink(&mut self.comments, "comments")?;
        self.comments_written += 1;
        Ok(())
    }

    /// Flushes the streamed datasets and writes the derived ones.
    pub fn finish(
        &mut self,
        interconnections: &[InterconnectionRecord],
        stats: &[CommunityStatsRecord],
    ) -> Result<(), CoreError> {
        flush_sink(&mut self.posts, "posts")?;
        flush_sink(&mut self.comments, "comments")?;

        let mut sink = create_sink(
            &self.paths.interconnections,
            "interconnections",
            INTERCONNECTIONS_COLUMNS,
        )?;
        for record in interconnections {
            sink.serialize(record).map_err(DatasetError::Csv)?;
        }
        flush_sink(&mut sink, "interconnections")?;

        let mut sink = create_sink(
            &self.paths.community_stats,
            "community_stats",
            COMMUNITY_STATS_COLUMNS,
        )?;
        for record in stats {
            sink.serialize(record).map_err(DatasetError::Csv)?;
        }
        flush_sink(&mut sink, "community_stats")?;

        info!(
            "Finished datasets: {} posts, {} comments, {} interconnections, {} community stats",
            self.posts_written,
            self.comments_written,
            interconnections.len(),
            stats.len()
        );

        Ok(())
    }

    pub fn paths(&self) -> &DatasetPaths {
        &self.paths
    }

    pub fn posts_written(&self) -> u64 {
        self.posts_written
    }

    pub fn comments_written(&self) -> u64 {
        self.comments_written
    }
}

fn create_sink(
    path: &Path,
    dataset: &str,
    columns: &[&str],
) -> Result<csv::Writer<File>, CoreError> {
    let file = File::create(path).map_err(|source| DatasetError::CreateFailed {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(columns).map_err(DatasetError::Csv)?;
    flush_sink(&mut writer, dataset)?;
    Ok(writer)
}

fn flush_sink(writer: &mut csv::Writer<File>, dataset: &str) -> Result<(), CoreError> {
    writer.flush().map_err(|source| DatasetError::WriteFailed {
        dataset: dataset.to_string(),
        source,
    })?;
    Ok(())
}
