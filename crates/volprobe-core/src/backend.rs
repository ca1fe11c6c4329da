//! The minimal interface a renderer needs to run the volume pipeline.

use crate::frame::FrameInput;

/// Operations the frame pipeline issues, in order, once per frame.
///
/// Implementations must make the results of each call visible to the calls
/// that follow it: the probe fill and the raymarch read what the previous
/// stages wrote. A single in-order command queue satisfies this.
pub trait RenderBackend {
    /// Where the raymarch writes its image.
    type Target;
    /// Backend failure type.
    type Error;

    /// Records the front and back cube surface passes.
    fn capture_bounds(&mut self, frame: &FrameInput) -> Result<(), Self::Error>;

    /// Recomputes the full probe grid for the frame's light.
    fn fill_probes(&mut self, frame: &FrameInput) -> Result<(), Self::Error>;

    /// Integrates every covered pixel into `target`.
    fn raymarch(&mut self, frame: &FrameInput, target: &mut Self::Target)
        -> Result<(), Self::Error>;

    /// Flushes the recorded work.
    fn submit(&mut self) -> Result<(), Self::Error>;
}

/// Runs one frame: bounds, probes, raymarch, submit.
pub fn render_frame<B: RenderBackend>(
    backend: &mut B,
    frame: &FrameInput,
    target: &mut B::Target,
) -> Result<(), B::Error> {
    backend.capture_bounds(frame)?;
    backend.fill_probes(frame)?;
    backend.raymarch(frame, target)?;
    backend.submit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CameraMatrices;
    use crate::params::RaymarchParams;
    use glam::Mat4;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        fail_probes: bool,
    }

    impl RenderBackend for Recorder {
        type Target = u32;
        type Error = &'static str;

        fn capture_bounds(&mut self, _frame: &FrameInput) -> Result<(), Self::Error> {
            self.calls.push("bounds");
            Ok(())
        }

        fn fill_probes(&mut self, _frame: &FrameInput) -> Result<(), Self::Error> {
            self.calls.push("probes");
            if self.fail_probes {
                return Err("probe pass failed");
            }
            Ok(())
        }

        fn raymarch(&mut self, _frame: &FrameInput, target: &mut u32) -> Result<(), Self::Error> {
            self.calls.push("raymarch");
            *target += 1;
            Ok(())
        }

        fn submit(&mut self) -> Result<(), Self::Error> {
            self.calls.push("submit");
            Ok(())
        }
    }

    fn frame() -> FrameInput {
        let camera = CameraMatrices {
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        };
        FrameInput::new(camera, RaymarchParams::default())
    }

    #[test]
    fn test_passes_run_in_order() {
        let mut backend = Recorder::default();
        let mut target = 0;
        render_frame(&mut backend, &frame(), &mut target).unwrap();
        assert_eq!(backend.calls, ["bounds", "probes", "raymarch", "submit"]);
        assert_eq!(target, 1);
    }

    #[test]
    fn test_failure_aborts_frame() {
        let mut backend = Recorder {
            fail_probes: true,
            ..Recorder::default()
        };
        let mut target = 0;
        assert!(render_frame(&mut backend, &frame(), &mut target).is_err());
        assert_eq!(backend.calls, ["bounds", "probes"]);
        assert_eq!(target, 0);
    }
}
