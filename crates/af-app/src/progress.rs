//! Staged progress events for a fitting run.

#[derive(Debug, Clone)]
pub enum RunStage {
    LoadingDataset,
    Preprocessing,
    Fitting,
    AdaptingResults,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingDataset => "loading dataset",
            RunStage::Preprocessing => "preprocessing",
            RunStage::Fitting => "fitting",
            RunStage::AdaptingResults => "adapting results",
            RunStage::SavingResults => "saving results",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FittingProgress {
    pub done: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub fitting: Option<FittingProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            fitting: None,
        }
    }
}
