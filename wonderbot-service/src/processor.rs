use dedup_log::DedupLogs;
use keyword_matcher::KeywordMatcher;
use std::fmt;
use tracing::{debug, info, warn};
use wonderbot_core::{BotConfig, Category, CoreError, ErrorReporter, Item, ItemSource, ReplySink};

/// Terminal state of one item after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    SkippedSelfAuthor,
    NotMatched,
    AlreadyLogged,
    Replied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub category: Category,
    pub fetched: usize,
    pub replied: usize,
    pub already_logged: usize,
    pub not_matched: usize,
    pub skipped_self: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn new(category: Category, fetched: usize) -> Self {
        Self {
            category,
            fetched,
            replied: 0,
            already_logged: 0,
            not_matched: 0,
            skipped_self: 0,
            failed: 0,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::SkippedSelfAuthor => self.skipped_self += 1,
            Outcome::NotMatched => self.not_matched += 1,
            Outcome::AlreadyLogged => self.already_logged += 1,
            Outcome::Replied => self.replied += 1,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}s: {} fetched, {} replied, {} already handled, {} not matched, {} own, {} failed",
            self.category,
            self.fetched,
            self.replied,
            self.already_logged,
            self.not_matched,
            self.skipped_self,
            self.failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub comments: BatchSummary,
    pub submissions: BatchSummary,
}

impl PassSummary {
    pub fn replied(&self) -> usize {
        self.comments.replied + self.submissions.replied
    }
}

/// Runs fetched items through the matcher and the dedup logs and replies to
/// new matches. The client supplies items and accepts replies.
pub struct BatchProcessor<C> {
    client: C,
    matcher: KeywordMatcher,
    logs: DedupLogs,
    config: BotConfig,
    reporter: ErrorReporter,
}

impl<C> BatchProcessor<C>
where
    C: ItemSource + ReplySink,
{
    pub fn new(client: C, config: BotConfig, logs: DedupLogs) -> Self {
        Self {
            client,
            matcher: KeywordMatcher::new(&config.keyword),
            logs,
            config,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// The id is logged before the reply goes out: a crash in between loses
    /// a reply instead of sending it twice.
    pub async fn process_item(&self, item: &Item) -> Result<Outcome, CoreError> {
        if item.is_authored_by(&self.config.bot_account) {
            debug!("Skipping own {} {}", item.category(), item.id());
            return Ok(Outcome::SkippedSelfAuthor);
        }

        if !self.matcher.needs_reply(&item.text_to_match()) {
            debug!("No keyword in {} {}", item.category(), item.id());
            return Ok(Outcome::NotMatched);
        }

        let log = self.logs.for_category(item.category());
        if log.contains(item.id()) {
            debug!("Already replied to {} {}", item.category(), item.id());
            return Ok(Outcome::AlreadyLogged);
        }

        log.append(item.id())?;
        self.client.reply(item, &self.config.reply_text).await?;
        info!("Replied to {} {}", item.category(), item.id());
        Ok(Outcome::Replied)
    }

    /// Fetch failures and log-write failures abort the batch. A failed reply
    /// only costs that one item.
    pub async fn process_category(&self, category: Category) -> Result<BatchSummary, CoreError> {
        let items = self
            .client
            .fetch_new(category, self.config.fetch_limit)
            .await?;
        let mut summary = BatchSummary::new(category, items.len());

        for item in &items {
            match self.process_item(item).await {
                Ok(outcome) => summary.record(outcome),
                Err(e @ CoreError::DedupLog(_)) => return Err(e),
                Err(e) => {
                    warn!(
                        "Reply to {} {} failed; it stays logged and will not be retried",
                        item.category(),
                        item.id()
                    );
                    self.reporter.report_error(&e);
                    summary.failed += 1;
                }
            }
        }

        info!("Finished batch: {}", summary);
        Ok(summary)
    }

    /// Comments first, then submissions, with the configured pause between.
    pub async fn run_pass(&self) -> Result<PassSummary, CoreError> {
        let comments = self.process_category(Category::Comment).await?;

        let pause = self.config.pass_pause();
        if !pause.is_zero() {
            debug!("Pausing {:?} before the submission batch", pause);
            tokio::time::sleep(pause).await;
        }

        let submissions = self.process_category(Category::Submission).await?;
        Ok(PassSummary {
            comments,
            submissions,
        })
    }
}
