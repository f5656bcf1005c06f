#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    GoToTab(usize),
    SelectNext,
    SelectPrev,
    RunSelectedCommand,
    KillSelected,
    RefreshProcesses,
    CycleSort,
    FasterSampling,
    SlowerSampling,
    None,
}
