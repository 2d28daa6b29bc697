//! Shift visible workspaces one output to the right.
//!
//! Focuses the workspace shown on the first output and moves it right, then
//! does the same for the third output. Indices are taken from the
//! `GET_OUTPUTS` reply as-is, inactive outputs included. When one of those
//! two outputs shows no workspace (i3 lists the `xroot-0` pseudo-output
//! first, with none), the rotation fails before issuing any command.

use crate::command::{Direction, OutputInfo};
use crate::traits::WindowManager;
use log::info;

/// Outputs whose visible workspace is moved, in order.
pub const ROTATED_OUTPUTS: [usize; 2] = [0, 2];

#[derive(Debug, thiserror::Error)]
pub enum RotateError {
    #[error("window manager error: {0}")]
    WindowManager(String),
    #[error("output #{index} does not exist (have {count})")]
    MissingOutput { index: usize, count: usize },
    #[error("output {0} shows no workspace")]
    NoWorkspace(String),
}

/// Run the rotation against `wm`.
///
/// Output workspaces are read once, up front. The first failure aborts the
/// sequence; steps already issued are not undone.
pub fn rotate_workspaces<W: WindowManager>(wm: &W) -> Result<(), RotateError> {
    let outputs = wm
        .outputs()
        .map_err(|e| RotateError::WindowManager(e.to_string()))?;

    for index in ROTATED_OUTPUTS {
        let workspace = current_workspace(&outputs, index)?;
        info!("moving workspace {} to output {}", workspace, Direction::Right);
        wm.focus_workspace(workspace)
            .map_err(|e| RotateError::WindowManager(e.to_string()))?;
        wm.move_workspace_to_output(Direction::Right)
            .map_err(|e| RotateError::WindowManager(e.to_string()))?;
    }
    Ok(())
}

fn current_workspace(outputs: &[OutputInfo], index: usize) -> Result<&str, RotateError> {
    let output = outputs.get(index).ok_or(RotateError::MissingOutput {
        index,
        count: outputs.len(),
    })?;
    output
        .current_workspace
        .as_deref()
        .ok_or_else(|| RotateError::NoWorkspace(output.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Focus(String),
        Move(Direction),
    }

    /// Records every call; optionally fails the n-th mutating call.
    #[derive(Debug, Default)]
    struct RecorderWm {
        outputs: Vec<OutputInfo>,
        calls: RefCell<Vec<Call>>,
        fail_at: Option<usize>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderErr;

    impl RecorderWm {
        fn record(&self, call: Call) -> Result<(), RecorderErr> {
            let mut calls = self.calls.borrow_mut();
            if self.fail_at == Some(calls.len()) {
                return Err(RecorderErr);
            }
            calls.push(call);
            Ok(())
        }
    }

    impl WindowManager for RecorderWm {
        type Error = RecorderErr;

        fn outputs(&self) -> Result<Vec<OutputInfo>, RecorderErr> {
            Ok(self.outputs.clone())
        }

        fn focus_workspace(&self, workspace: &str) -> Result<(), RecorderErr> {
            self.record(Call::Focus(workspace.into()))
        }

        fn move_workspace_to_output(&self, direction: Direction) -> Result<(), RecorderErr> {
            self.record(Call::Move(direction))
        }
    }

    fn output(name: &str, workspace: Option<&str>) -> OutputInfo {
        OutputInfo {
            name: name.into(),
            active: workspace.is_some(),
            current_workspace: workspace.map(Into::into),
        }
    }

    fn three_outputs() -> Vec<OutputInfo> {
        vec![
            output("DP-1", Some("1")),
            output("DP-2", Some("5")),
            output("HDMI-A-1", Some("9")),
        ]
    }

    #[test]
    fn rotates_first_and_third_output() {
        let wm = RecorderWm {
            outputs: three_outputs(),
            ..RecorderWm::default()
        };
        rotate_workspaces(&wm).unwrap();
        assert_eq!(
            *wm.calls.borrow(),
            vec![
                Call::Focus("1".into()),
                Call::Move(Direction::Right),
                Call::Focus("9".into()),
                Call::Move(Direction::Right),
            ]
        );
    }

    #[test]
    fn too_few_outputs_fails_after_first_step() {
        let wm = RecorderWm {
            outputs: three_outputs()[..2].to_vec(),
            ..RecorderWm::default()
        };
        let err = rotate_workspaces(&wm).unwrap_err();
        assert!(matches!(err, RotateError::MissingOutput { index: 2, count: 2 }));
        assert_eq!(wm.calls.borrow().len(), 2);
    }

    #[test]
    fn xroot_pseudo_output_first_fails_without_commands() {
        let wm = RecorderWm {
            outputs: vec![output("xroot-0", None), output("DP-1", Some("1")), output("DP-2", Some("2"))],
            ..RecorderWm::default()
        };
        let err = rotate_workspaces(&wm).unwrap_err();
        assert!(matches!(err, RotateError::NoWorkspace(ref name) if name == "xroot-0"));
        assert!(wm.calls.borrow().is_empty());
    }

    #[test]
    fn inactive_outputs_keep_their_index() {
        let wm = RecorderWm {
            outputs: vec![
                output("DP-1", Some("1")),
                output("VGA-1", None),
                output("DP-2", Some("2")),
            ],
            ..RecorderWm::default()
        };
        rotate_workspaces(&wm).unwrap();
        assert_eq!(
            *wm.calls.borrow(),
            vec![
                Call::Focus("1".into()),
                Call::Move(Direction::Right),
                Call::Focus("2".into()),
                Call::Move(Direction::Right),
            ]
        );
    }

    #[test]
    fn ipc_failure_aborts_sequence() {
        let wm = RecorderWm {
            outputs: three_outputs(),
            fail_at: Some(1),
            ..RecorderWm::default()
        };
        let err = rotate_workspaces(&wm).unwrap_err();
        assert!(matches!(err, RotateError::WindowManager(_)));
        assert_eq!(*wm.calls.borrow(), vec![Call::Focus("1".into())]);
    }
}
