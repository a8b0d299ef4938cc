//! Batched set commands.

/// A single command queued in a [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCommand {
    /// Add `member` to the set at `key`.
    SAdd {
        /// Set key.
        key: String,
        /// Member to add.
        member: String,
    },
    /// Remove `member` from the set at `key`.
    SRem {
        /// Set key.
        key: String,
        /// Member to remove.
        member: String,
    },
}

impl PipelineCommand {
    /// Returns the set key this command touches.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::SAdd { key, .. } | Self::SRem { key, .. } => key,
        }
    }
}

/// An ordered batch of commands sent to the store in one round trip.
///
/// Commands execute in the order they were queued. The batch as a whole is
/// not atomic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<PipelineCommand>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an `SADD`.
    pub fn sadd(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.commands.push(PipelineCommand::SAdd {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    /// Queues an `SREM`.
    pub fn srem(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.commands.push(PipelineCommand::SRem {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    /// Returns the number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the queued commands.
    #[must_use]
    pub fn commands(&self) -> &[PipelineCommand] {
        &self.commands
    }

    /// Consumes the pipeline, returning its commands.
    #[must_use]
    pub fn into_commands(self) -> Vec<PipelineCommand> {
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_keeps_order() {
        let mut pipeline = Pipeline::new();
        assert!(pipeline.is_empty());

        pipeline.sadd("idx:a", "1").srem("idx:b", "1");
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.commands()[0].key(), "idx:a");
        assert!(matches!(
            pipeline.commands()[1],
            PipelineCommand::SRem { .. }
        ));
    }
}
