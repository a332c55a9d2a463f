use parley_core::TranscriptTurn;

/// Ordered, append-only record of one session's conversation.
#[derive(Debug, Clone, Default)]
pub struct TranscriptRecorder {
    turns: Vec<TranscriptTurn>,
}

impl TranscriptRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: TranscriptTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[TranscriptTurn] {
        &self.turns
    }

    /// Owned copy for work that outlives the borrow, like a pipeline run.
    pub fn snapshot(&self) -> Vec<TranscriptTurn> {
        self.turns.clone()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
