//! One run: list the pool, pick an image, write its haiku, publish, advance the cursor.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use url::Url;

use crate::cli::CursorMode;
use crate::cursor::{CursorStore, last_image_from_record};
use crate::error::PipelineError;
use crate::generator::Generator;
use crate::pool::{ImageId, ImageSource};
use crate::publisher::Publisher;
use crate::record::{HaikuRecord, image_reference};
use crate::selector::{Selection, SelectionEvent, select_after, select_next};

/// Something that happened during a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RunEventKind {
    /// The pool was listed.
    PoolListed {
        /// Images in the pool.
        size: usize,
    },
    /// An image was chosen.
    Selected {
        /// The choice.
        image: ImageId,
        /// How it was reached.
        event: SelectionEvent,
    },
    /// The model answered.
    HaikuGenerated {
        /// Characters in the trimmed haiku.
        chars: usize,
    },
    /// The record replaced the previous one.
    Published {
        /// The record's `image` field.
        image: String,
    },
    /// The history was written.
    CursorSaved {
        /// Entries now in the history.
        entries: usize,
    },
}

impl fmt::Display for RunEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolListed { size } => write!(f, "Found {size} images in the pool"),
            Self::Selected { image, event } => match event {
                SelectionEvent::Advanced => write!(f, "Selected {image}"),
                SelectionEvent::CycleReset => {
                    write!(f, "All images used, restarting cycle; selected {image}")
                }
                SelectionEvent::NoPrevious => {
                    write!(f, "No previous record, starting from {image}")
                }
                SelectionEvent::PreviousMissing => {
                    write!(f, "Previous image left the pool, starting from {image}")
                }
            },
            Self::HaikuGenerated { chars } => write!(f, "Generated haiku ({chars} chars)"),
            Self::Published { image } => write!(f, "Published record for {image}"),
            Self::CursorSaved { entries } => write!(f, "Saved cursor ({entries} used)"),
        }
    }
}

/// A timestamped run event.
#[derive(Clone, Debug)]
pub struct RunEvent {
    /// When it happened.
    pub at: DateTime<Utc>,
    /// What happened.
    pub kind: RunEventKind,
}

/// The run log, plus the record a successful run produced.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    /// Events in order.
    pub events: Vec<RunEvent>,
    /// The published record.
    pub record: Option<HaikuRecord>,
}

impl RunReport {
    fn push(&mut self, kind: RunEventKind) {
        match &kind {
            RunEventKind::Selected {
                event: SelectionEvent::CycleReset | SelectionEvent::PreviousMissing,
                ..
            } => warn!("{kind}"),
            _ => info!("{kind}"),
        }
        self.events.push(RunEvent {
            at: Utc::now(),
            kind,
        });
    }

    /// The image chosen this run.
    pub fn selected(&self) -> Option<&ImageId> {
        self.events.iter().find_map(|event| match &event.kind {
            RunEventKind::Selected { image, .. } => Some(image),
            _ => None,
        })
    }

    /// True when this run restarted the cycle.
    pub fn cycle_reset(&self) -> bool {
        self.events.iter().any(|event| {
            matches!(
                event.kind,
                RunEventKind::Selected {
                    event: SelectionEvent::CycleReset,
                    ..
                }
            )
        })
    }
}

/// The pipeline and its collaborators.
#[derive(Debug)]
pub struct Pipeline<S, G, P> {
    source: S,
    generator: G,
    publisher: P,
    cursor: CursorStore,
    mode: CursorMode,
    public_base_url: Option<Url>,
}

impl<S, G, P> Pipeline<S, G, P>
where
    S: ImageSource,
    G: Generator,
    P: Publisher,
{
    /// History-mode pipeline with relative image references.
    pub fn new(source: S, generator: G, publisher: P, cursor: CursorStore) -> Self {
        Self {
            source,
            generator,
            publisher,
            cursor,
            mode: CursorMode::History,
            public_base_url: None,
        }
    }

    /// Picks the cursor strategy.
    pub fn with_mode(mut self, mode: CursorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Makes record image references absolute URLs under `base`.
    pub fn with_public_base_url(mut self, base: Option<Url>) -> Self {
        self.public_base_url = base;
        self
    }

    /// Runs once. The cursor is only written after the record is published.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();

        let pool = self.source.list().await.map_err(PipelineError::Source)?;
        report.push(RunEventKind::PoolListed { size: pool.len() });

        let selection = self.select(&pool).await?;
        report.push(RunEventKind::Selected {
            image: selection.image.clone(),
            event: selection.event,
        });

        let bytes = self
            .source
            .fetch(&selection.image)
            .await
            .map_err(PipelineError::Source)?;
        let haiku = self
            .generator
            .describe(&selection.image, &bytes)
            .await
            .map_err(PipelineError::Generator)?;
        let haiku = haiku.trim();
        if haiku.is_empty() {
            return Err(PipelineError::Generator(anyhow::anyhow!(
                "Model returned an empty haiku"
            )));
        }
        report.push(RunEventKind::HaikuGenerated {
            chars: haiku.chars().count(),
        });

        let reference = image_reference(self.public_base_url.as_ref(), &selection.image)
            .map_err(PipelineError::Publish)?;
        let record = HaikuRecord::today(reference, haiku);
        self.publisher
            .publish(&record, &selection.image, &bytes)
            .await
            .map_err(PipelineError::Publish)?;
        report.push(RunEventKind::Published {
            image: record.image.clone(),
        });
        report.record = Some(record);

        if self.mode == CursorMode::History {
            self.cursor
                .save(&selection.used)
                .map_err(PipelineError::Cursor)?;
            report.push(RunEventKind::CursorSaved {
                entries: selection.used.len(),
            });
        }

        Ok(report)
    }

    async fn select(&self, pool: &[ImageId]) -> Result<Selection, PipelineError> {
        let selection = match self.mode {
            CursorMode::History => select_next(pool, &self.cursor.load())?,
            CursorMode::Pointer => {
                let last = self
                    .publisher
                    .last_record()
                    .await
                    .and_then(|record| last_image_from_record(&record));
                select_after(pool, last.as_ref())?
            }
        };
        Ok(selection)
    }
}
