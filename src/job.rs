//! Multi-copy print job orchestration.
//!
//! A "print N copies" request is turned into N single-sheet submissions.
//! The device only ever sees one sheet at a time; between sheets the
//! controller polls the status word and budgets its waits against the
//! request's total wall-clock timeout, so a kiosk can run jobs unattended
//! and still get a definite answer: succeeded, failed at a known copy, or
//! submitted with completion unconfirmed.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::bitmap::{ImageBuffer, ImagePreparer, SinglePagePreparer};
use crate::channel::{DeviceChannel, JobOptions};
use crate::error::Error;
use crate::paper::{PaperProfile, QualityMode};
use crate::status::{classify, describe, Classified, UnknownPolicy};
use crate::wait::{wait_until_ready, CancelToken, WaitConfig, WaitOutcome};

/// Result code meaning the device accepted the sheet.
pub const SUBMIT_ACCEPTED: u32 = 0;
/// Non-zero result some firmware revisions return for a sheet that was
/// nevertheless accepted.
pub const SUBMIT_ALREADY_ACCEPTED: u32 = 1801;

/// Everything needed to print one job.
#[derive(Debug, Clone)]
pub struct PrintJobRequest {
    images: Vec<ImageBuffer>,
    profile: PaperProfile,
    quality: QualityMode,
    copies: u32,
    matte: bool,
    wait_for_completion: bool,
    timeout: Duration,
}

impl PrintJobRequest {
    /// A single-copy request with default quality and a 120 second budget.
    pub fn new(profile: PaperProfile, images: Vec<ImageBuffer>) -> Self {
        PrintJobRequest {
            images,
            profile,
            quality: QualityMode::default(),
            copies: 1,
            matte: false,
            wait_for_completion: false,
            timeout: Duration::from_secs(120),
        }
    }

    /// Number of sheets to print, coerced to at least 1.
    pub fn copies(self, copies: u32) -> Self {
        PrintJobRequest {
            copies: copies.max(1),
            ..self
        }
    }

    pub fn quality(self, quality: QualityMode) -> Self {
        PrintJobRequest { quality, ..self }
    }

    pub fn matte(self, matte: bool) -> Self {
        PrintJobRequest { matte, ..self }
    }

    /// Whether to poll for completion after each sheet instead of
    /// returning as soon as the last one is accepted.
    pub fn wait_for_completion(self, wait: bool) -> Self {
        PrintJobRequest {
            wait_for_completion: wait,
            ..self
        }
    }

    /// Total wall-clock budget for the whole job.
    pub fn timeout(self, timeout: Duration) -> Self {
        PrintJobRequest { timeout, ..self }
    }

    pub fn profile(&self) -> &PaperProfile {
        &self.profile
    }

    fn job_options(&self) -> JobOptions {
        JobOptions {
            paper: self.profile.paper,
            quality: self.quality,
            orientation: self.profile.orientation,
            matte: self.matte,
            copies: 1,
        }
    }
}

/// State of one sheet within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    /// Not handed to the device yet.
    Pending,
    /// Handed to the device; completion not confirmed.
    Submitted,
    /// Confirmed done (or accepted, when the job does not wait).
    Completed,
    /// The device rejected the submission with this result code.
    Failed(u32),
    /// Never attempted because the job aborted earlier.
    Unattempted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyAttempt {
    pub index: u32,
    pub state: CopyState,
}

/// Overall job verdict.
#[derive(Debug)]
pub enum Verdict {
    Succeeded,
    Failed(Error),
    /// Every sheet was submitted but the final confirmation wait ran out.
    /// The physical print most likely succeeded; this is deliberately not
    /// `Failed`.
    TimedOutWaiting,
}

/// What happened to a job, per copy and overall.
#[derive(Debug)]
pub struct JobOutcome {
    pub copies: Vec<CopyAttempt>,
    pub verdict: Verdict,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.verdict, Verdict::Succeeded)
    }
}

// Progress marker for transition logs; copy indexes are logged alongside.
#[derive(Debug, Clone, Copy)]
enum JobPhase {
    Validating,
    WaitingPrecondition,
    SubmittingCopy,
    WaitingBetweenCopies,
    WaitingFinal,
}

/// Tunables for the submission loop.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Sleep between status polls in completion waits.
    pub poll_interval: Duration,
    /// Readiness gate budget before a repeat sheet.
    pub precheck_timeout: Duration,
    /// Backoff cap for transient channel failures during polls.
    pub max_backoff: Duration,
    /// How unrecognized status codes are treated.
    pub unknown_policy: UnknownPolicy,
    /// Submission result codes counted as success.
    pub accepted_submit_codes: Vec<u32>,
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig {
            poll_interval: Duration::from_secs(1),
            precheck_timeout: Duration::from_secs(30),
            max_backoff: Duration::from_secs(8),
            unknown_policy: UnknownPolicy::default(),
            accepted_submit_codes: vec![SUBMIT_ACCEPTED, SUBMIT_ALREADY_ACCEPTED],
        }
    }
}

/// Drives a [`PrintJobRequest`] over an exclusively owned
/// [`DeviceChannel`].
///
/// One controller/channel pair per device; nothing is shared. All waits
/// are blocking sleeps on the calling thread, interruptible through the
/// optional [`CancelToken`].
pub struct JobController<P: ImagePreparer = SinglePagePreparer> {
    config: JobConfig,
    preparer: P,
}

impl JobController<SinglePagePreparer> {
    pub fn new() -> Self {
        Self::with_config(JobConfig::default())
    }

    pub fn with_config(config: JobConfig) -> Self {
        Self::with_preparer(config, SinglePagePreparer)
    }
}

impl Default for JobController<SinglePagePreparer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ImagePreparer> JobController<P> {
    /// Use a custom page preparer, e.g. a split-layout compositor.
    pub fn with_preparer(config: JobConfig, preparer: P) -> Self {
        JobController { config, preparer }
    }

    /// Run a job to completion.
    ///
    /// Validation and connection-level failures come back as `Err`;
    /// everything the device itself decided is reported inside the
    /// [`JobOutcome`].
    pub fn submit_job<C: DeviceChannel>(
        &self,
        request: &PrintJobRequest,
        channel: &mut C,
        cancel: Option<&CancelToken>,
    ) -> Result<JobOutcome, Error> {
        let started = Instant::now();

        debug!("job phase: {:?}", JobPhase::Validating);
        let page = self.validate_and_prepare(request)?;
        let total = request.copies;
        let mut copies: Vec<CopyAttempt> = (0..total)
            .map(|index| CopyAttempt {
                index,
                state: CopyState::Pending,
            })
            .collect();

        debug!("job phase: {:?}", JobPhase::WaitingPrecondition);
        let raw = channel.read_status()?;
        debug!("initial status: {} (0x{:08X})", describe(raw), raw);
        match classify(raw) {
            Classified::Fault { raw, text } => {
                return Ok(abort(copies, 0, Error::DeviceFault { raw, text }));
            }
            Classified::Offline => return Ok(abort(copies, 0, Error::Offline)),
            Classified::Printing | Classified::TransientActive => {
                if !request.wait_for_completion {
                    return Ok(abort(copies, 0, Error::DeviceBusy));
                }
                let config = self.wait_config(self.remaining(request, started));
                match wait_until_ready(|| channel.read_status(), &config, cancel)? {
                    WaitOutcome::Ready => {}
                    WaitOutcome::Fault { raw, text } => {
                        return Ok(abort(copies, 0, Error::DeviceFault { raw, text }));
                    }
                    WaitOutcome::TimedOut => {
                        return Ok(abort(copies, 0, Error::Timeout(request.timeout)));
                    }
                }
            }
            Classified::Unknown { raw } => {
                warn!("proceeding on unknown status 0x{:08X}", raw);
            }
            Classified::Ready | Classified::Busy => {}
        }

        let options = request.job_options();
        // Set when a between-copies wait just confirmed Ready, so the
        // pre-submit gate is not a redundant second poll.
        let mut confirmed_ready = false;

        for i in 0..total {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(Error::Cancelled);
                }
            }

            if i > 0 && !confirmed_ready {
                debug!("job phase: {:?}", JobPhase::WaitingPrecondition);
                info!("waiting for the printer before copy {}/{}", i + 1, total);
                let budget = self.config.precheck_timeout.min(self.remaining(request, started));
                let config = self.wait_config(budget);
                match wait_until_ready(|| channel.read_status(), &config, cancel)? {
                    WaitOutcome::Ready => {}
                    WaitOutcome::Fault { raw, text } => {
                        return Ok(abort(copies, i, Error::DeviceFault { raw, text }));
                    }
                    WaitOutcome::TimedOut => {
                        warn!("printer not ready, aborting at copy {}/{}", i + 1, total);
                        return Ok(abort(copies, i, Error::Timeout(budget)));
                    }
                }
            }
            confirmed_ready = false;

            debug!("job phase: {:?}, copy {}/{}", JobPhase::SubmittingCopy, i + 1, total);
            copies[i as usize].state = CopyState::Submitted;
            let code = channel.submit_one_page(&options, &page)?;
            if !self.config.accepted_submit_codes.contains(&code) {
                copies[i as usize].state = CopyState::Failed(code);
                return Ok(abort(copies, i + 1, Error::SubmitRejected { copy: i, code }));
            }
            info!("copy {}/{} submitted", i + 1, total);

            if !request.wait_for_completion {
                copies[i as usize].state = CopyState::Completed;
                continue;
            }

            if i + 1 < total {
                debug!(
                    "job phase: {:?}, copy {}/{}",
                    JobPhase::WaitingBetweenCopies,
                    i + 1,
                    total
                );
                let budget = self.remaining(request, started) / (total - i);
                let config = self.wait_config(budget);
                match wait_until_ready(|| channel.read_status(), &config, cancel)? {
                    WaitOutcome::Ready => {
                        mark_submitted_completed(&mut copies);
                        confirmed_ready = true;
                    }
                    WaitOutcome::Fault { raw, text } => {
                        return Ok(abort(copies, i + 1, Error::DeviceFault { raw, text }));
                    }
                    // Not fatal on its own; the pre-submit gate for the
                    // next copy decides whether the job can go on.
                    WaitOutcome::TimedOut => {
                        debug!("copy {}/{} completion unconfirmed", i + 1, total)
                    }
                }
            }
        }

        if request.wait_for_completion {
            debug!("job phase: {:?}", JobPhase::WaitingFinal);
            let budget = self.remaining(request, started) / 2;
            info!("waiting up to {:?} for the final sheet", budget);
            let config = self.wait_config(budget);
            match wait_until_ready(|| channel.read_status(), &config, cancel)? {
                WaitOutcome::Ready => mark_submitted_completed(&mut copies),
                WaitOutcome::Fault { raw, text } => {
                    return Ok(JobOutcome {
                        copies,
                        verdict: Verdict::Failed(Error::DeviceFault { raw, text }),
                    });
                }
                WaitOutcome::TimedOut => {
                    warn!("final confirmation wait exhausted {:?}", budget);
                    return Ok(JobOutcome {
                        copies,
                        verdict: Verdict::TimedOutWaiting,
                    });
                }
            }
        }

        info!("job finished: {} copies", total);
        Ok(JobOutcome {
            copies,
            verdict: Verdict::Succeeded,
        })
    }

    fn validate_and_prepare(&self, request: &PrintJobRequest) -> Result<ImageBuffer, Error> {
        if request.images.is_empty() {
            return Err(Error::Validation("no images supplied".to_string()));
        }
        let expected = request.profile.expected_images() as usize;
        let images: &[ImageBuffer] = if request.profile.paper.is_split() {
            if request.images.len() < expected {
                return Err(Error::Validation(format!(
                    "split layout {:?} needs {} images, got {}",
                    request.profile.paper,
                    expected,
                    request.images.len()
                )));
            }
            if request.images.len() > expected {
                // Surplus images are accepted and ignored.
                warn!(
                    "ignoring {} extra images for {:?}",
                    request.images.len() - expected,
                    request.profile.paper
                );
            }
            &request.images[..expected]
        } else {
            if request.images.len() != 1 {
                return Err(Error::Validation(format!(
                    "{:?} prints one image, got {}",
                    request.profile.paper,
                    request.images.len()
                )));
            }
            &request.images[..]
        };

        let page = self.preparer.prepare_page(images, &request.profile)?;
        if !page.matches_profile(&request.profile) {
            return Err(Error::Validation(format!(
                "prepared page is {}x{}, profile needs {:?}",
                page.width(),
                page.height(),
                request.profile.pixel_dimensions()
            )));
        }
        Ok(page)
    }

    fn wait_config(&self, timeout: Duration) -> WaitConfig {
        WaitConfig {
            timeout,
            interval: self.config.poll_interval,
            max_backoff: self.config.max_backoff,
            unknown_policy: self.config.unknown_policy,
        }
    }

    fn remaining(&self, request: &PrintJobRequest, started: Instant) -> Duration {
        request.timeout.saturating_sub(started.elapsed())
    }
}

// Mark copies from `from` on as never attempted and wrap up a failed job.
fn abort(mut copies: Vec<CopyAttempt>, from: u32, reason: Error) -> JobOutcome {
    for copy in copies.iter_mut().skip(from as usize) {
        if copy.state == CopyState::Pending {
            copy.state = CopyState::Unattempted;
        }
    }
    JobOutcome {
        copies,
        verdict: Verdict::Failed(reason),
    }
}

// The printer confirmed idle, so every submitted sheet is physically done.
fn mark_submitted_completed(copies: &mut [CopyAttempt]) {
    for copy in copies.iter_mut() {
        if copy.state == CopyState::Submitted {
            copy.state = CopyState::Completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::row_stride;
    use crate::paper::{PaperProfile, PaperType};
    use crate::status;
    use std::collections::VecDeque;

    // Channel double driven by scripted status words and submit results.
    // The last status sticks once the script runs dry.
    struct ScriptedChannel {
        statuses: VecDeque<u32>,
        submit_results: VecDeque<u32>,
        status_reads: u32,
        reads_at_submit: Vec<u32>,
        submitted_copies: Vec<u16>,
    }

    impl ScriptedChannel {
        fn new(statuses: &[u32], submit_results: &[u32]) -> Self {
            ScriptedChannel {
                statuses: statuses.iter().copied().collect(),
                submit_results: submit_results.iter().copied().collect(),
                status_reads: 0,
                reads_at_submit: Vec::new(),
                submitted_copies: Vec::new(),
            }
        }
    }

    impl DeviceChannel for ScriptedChannel {
        fn read_status(&mut self) -> Result<u32, Error> {
            self.status_reads += 1;
            if self.statuses.len() > 1 {
                Ok(self.statuses.pop_front().unwrap())
            } else {
                Ok(self.statuses.front().copied().unwrap_or(status::OK))
            }
        }

        fn send_command(&mut self, _: crate::channel::CommandCode) -> Result<u32, Error> {
            Ok(0)
        }

        fn submit_one_page(
            &mut self,
            options: &JobOptions,
            _: &ImageBuffer,
        ) -> Result<u32, Error> {
            self.reads_at_submit.push(self.status_reads);
            self.submitted_copies.push(options.copies);
            Ok(self.submit_results.pop_front().unwrap_or(SUBMIT_ACCEPTED))
        }

        fn read_device_info(
            &mut self,
            _: crate::channel::InfoKind,
        ) -> Result<Vec<u8>, Error> {
            Ok(Vec::new())
        }
    }

    fn page_for(profile: &PaperProfile) -> ImageBuffer {
        let (w, h) = profile.pixel_dimensions();
        ImageBuffer::new(w, h, vec![0u8; row_stride(w) * h as usize]).unwrap()
    }

    fn fast_controller() -> JobController {
        JobController::with_config(JobConfig {
            poll_interval: Duration::from_millis(5),
            precheck_timeout: Duration::from_millis(100),
            max_backoff: Duration::from_millis(40),
            ..JobConfig::default()
        })
    }

    fn request(copies: u32) -> PrintJobRequest {
        let profile = PaperProfile::portrait(PaperType::Photo4x6);
        PrintJobRequest::new(profile, vec![page_for(&profile)]).copies(copies)
    }

    fn states(outcome: &JobOutcome) -> Vec<CopyState> {
        outcome.copies.iter().map(|c| c.state).collect()
    }

    #[test]
    fn single_copy_without_wait_skips_post_submit_polling() {
        let mut channel = ScriptedChannel::new(&[status::OK], &[SUBMIT_ACCEPTED]);
        let outcome = fast_controller()
            .submit_job(&request(1), &mut channel, None)
            .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(states(&outcome), vec![CopyState::Completed]);
        // Exactly the precondition read, nothing after the submit.
        assert_eq!(channel.status_reads, 1);
        assert_eq!(channel.submitted_copies, vec![1]);
    }

    #[test]
    fn rejected_submission_fails_the_copy_and_skips_the_rest() {
        let mut channel =
            ScriptedChannel::new(&[status::OK], &[SUBMIT_ACCEPTED, 0x1234, SUBMIT_ACCEPTED]);
        let outcome = fast_controller()
            .submit_job(&request(3), &mut channel, None)
            .unwrap();

        assert_eq!(
            states(&outcome),
            vec![
                CopyState::Completed,
                CopyState::Failed(0x1234),
                CopyState::Unattempted
            ]
        );
        match outcome.verdict {
            Verdict::Failed(Error::SubmitRejected { copy: 1, code: 0x1234 }) => {}
            other => panic!("unexpected verdict {:?}", other),
        }
    }

    #[test]
    fn gate_timeout_aborts_remaining_copies() {
        // Ready for the precondition check, then stuck busy: the
        // readiness gate before copy 2 must give up and leave the
        // unsubmitted copies unattempted.
        let mut channel = ScriptedChannel::new(
            &[status::OK, status::BUSY],
            &[SUBMIT_ACCEPTED, SUBMIT_ACCEPTED, SUBMIT_ACCEPTED],
        );
        let outcome = fast_controller()
            .submit_job(&request(3), &mut channel, None)
            .unwrap();

        assert_eq!(
            states(&outcome),
            vec![
                CopyState::Completed,
                CopyState::Unattempted,
                CopyState::Unattempted
            ]
        );
        assert!(matches!(outcome.verdict, Verdict::Failed(Error::Timeout(_))));
        // Only the first sheet ever reached the device.
        assert_eq!(channel.reads_at_submit.len(), 1);
    }

    #[test]
    fn vendor_accept_code_counts_as_success() {
        let mut channel = ScriptedChannel::new(&[status::OK], &[SUBMIT_ALREADY_ACCEPTED]);
        let outcome = fast_controller()
            .submit_job(&request(1), &mut channel, None)
            .unwrap();
        assert!(outcome.succeeded());
    }

    #[test]
    fn between_copy_polls_happen_once() {
        // Precondition read, then Busy, Busy, Ready between the copies.
        let mut channel = ScriptedChannel::new(
            &[status::OK, status::BUSY, status::BUSY, status::OK],
            &[SUBMIT_ACCEPTED, SUBMIT_ACCEPTED],
        );
        let outcome = fast_controller()
            .submit_job(&request(2).wait_for_completion(true), &mut channel, None)
            .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(
            states(&outcome),
            vec![CopyState::Completed, CopyState::Completed]
        );
        // Exactly three polls between the two submissions; the readiness
        // that ended the completion wait is not re-checked by a gate.
        assert_eq!(channel.reads_at_submit.len(), 2);
        assert_eq!(channel.reads_at_submit[1] - channel.reads_at_submit[0], 3);
    }

    #[test]
    fn exhausted_final_wait_is_timed_out_waiting_not_failed() {
        let mut channel = ScriptedChannel::new(
            &[status::OK, status::BUSY],
            &[SUBMIT_ACCEPTED],
        );
        let outcome = fast_controller()
            .submit_job(
                &request(1)
                    .wait_for_completion(true)
                    .timeout(Duration::from_millis(120)),
                &mut channel,
                None,
            )
            .unwrap();

        assert!(matches!(outcome.verdict, Verdict::TimedOutWaiting));
        assert_eq!(states(&outcome), vec![CopyState::Submitted]);
    }

    #[test]
    fn fault_during_final_wait_fails_the_job() {
        let mut channel = ScriptedChannel::new(
            &[status::OK, status::PAPER_JAM],
            &[SUBMIT_ACCEPTED],
        );
        let outcome = fast_controller()
            .submit_job(&request(1).wait_for_completion(true), &mut channel, None)
            .unwrap();
        assert!(matches!(
            outcome.verdict,
            Verdict::Failed(Error::DeviceFault {
                raw: status::PAPER_JAM,
                ..
            })
        ));
    }

    #[test]
    fn fault_between_copies_aborts_the_remainder() {
        let mut channel = ScriptedChannel::new(
            &[status::OK, status::OUT_OF_RIBBON],
            &[SUBMIT_ACCEPTED, SUBMIT_ACCEPTED],
        );
        let outcome = fast_controller()
            .submit_job(&request(2).wait_for_completion(true), &mut channel, None)
            .unwrap();

        assert_eq!(
            states(&outcome),
            vec![CopyState::Submitted, CopyState::Unattempted]
        );
        assert!(matches!(
            outcome.verdict,
            Verdict::Failed(Error::DeviceFault { .. })
        ));
    }

    #[test]
    fn fatal_precondition_aborts_before_any_submission() {
        let mut channel = ScriptedChannel::new(&[status::PAPER_OUT], &[]);
        let outcome = fast_controller()
            .submit_job(&request(2), &mut channel, None)
            .unwrap();

        assert_eq!(
            states(&outcome),
            vec![CopyState::Unattempted, CopyState::Unattempted]
        );
        assert!(matches!(
            outcome.verdict,
            Verdict::Failed(Error::DeviceFault {
                raw: status::PAPER_OUT,
                ..
            })
        ));
        assert!(channel.reads_at_submit.is_empty());
    }

    #[test]
    fn offline_precondition_aborts() {
        let mut channel = ScriptedChannel::new(&[status::OFFLINE], &[]);
        let outcome = fast_controller()
            .submit_job(&request(1), &mut channel, None)
            .unwrap();
        assert!(matches!(outcome.verdict, Verdict::Failed(Error::Offline)));
    }

    #[test]
    fn printing_device_without_wait_is_reported_busy() {
        let mut channel = ScriptedChannel::new(&[status::PRINTING], &[]);
        let outcome = fast_controller()
            .submit_job(&request(1), &mut channel, None)
            .unwrap();
        assert!(matches!(outcome.verdict, Verdict::Failed(Error::DeviceBusy)));
    }

    #[test]
    fn printing_device_with_wait_proceeds_once_ready() {
        let mut channel = ScriptedChannel::new(
            &[status::PRINTING, status::PRINT_IN_PROGRESS, status::OK],
            &[SUBMIT_ACCEPTED],
        );
        let outcome = fast_controller()
            .submit_job(&request(1).wait_for_completion(true), &mut channel, None)
            .unwrap();
        assert!(outcome.succeeded());
    }

    #[test]
    fn copy_count_is_coerced_to_one() {
        let mut channel = ScriptedChannel::new(&[status::OK], &[SUBMIT_ACCEPTED]);
        let outcome = fast_controller()
            .submit_job(&request(0), &mut channel, None)
            .unwrap();
        assert_eq!(outcome.copies.len(), 1);
        assert!(outcome.succeeded());
    }

    #[test]
    fn empty_image_list_is_a_validation_error() {
        let profile = PaperProfile::portrait(PaperType::Photo4x6);
        let request = PrintJobRequest::new(profile, Vec::new());
        let mut channel = ScriptedChannel::new(&[status::OK], &[]);
        let result = fast_controller().submit_job(&request, &mut channel, None);
        assert!(matches!(result, Err(Error::Validation(_))));
        // Validation happens before any device interaction.
        assert_eq!(channel.status_reads, 0);
    }

    #[test]
    fn wrong_page_dimensions_are_a_validation_error() {
        let profile = PaperProfile::portrait(PaperType::Photo4x6);
        let small = ImageBuffer::new(4, 4, vec![0u8; row_stride(4) * 4]).unwrap();
        let request = PrintJobRequest::new(profile, vec![small]);
        let mut channel = ScriptedChannel::new(&[status::OK], &[]);
        let result = fast_controller().submit_job(&request, &mut channel, None);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    // Preparer double for split layouts: records how many sub-images it
    // was handed and emits a correctly sized page.
    struct CountingPreparer {
        seen: std::cell::Cell<usize>,
    }

    impl ImagePreparer for CountingPreparer {
        fn prepare_page(
            &self,
            images: &[ImageBuffer],
            profile: &PaperProfile,
        ) -> Result<ImageBuffer, Error> {
            self.seen.set(images.len());
            Ok(page_for(profile))
        }
    }

    fn split_request(image_count: usize) -> PrintJobRequest {
        let profile = PaperProfile::portrait(PaperType::Photo4x6Split2);
        let sub = ImageBuffer::new(4, 4, vec![0u8; row_stride(4) * 4]).unwrap();
        PrintJobRequest::new(profile, vec![sub; image_count])
    }

    #[test]
    fn split_undersupply_is_rejected() {
        let controller = JobController::with_preparer(
            JobConfig::default(),
            CountingPreparer {
                seen: std::cell::Cell::new(0),
            },
        );
        let mut channel = ScriptedChannel::new(&[status::OK], &[]);
        let result = controller.submit_job(&split_request(1), &mut channel, None);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn split_surplus_is_accepted_and_trimmed() {
        let controller = JobController::with_preparer(
            JobConfig {
                poll_interval: Duration::from_millis(5),
                ..JobConfig::default()
            },
            CountingPreparer {
                seen: std::cell::Cell::new(0),
            },
        );
        let mut channel = ScriptedChannel::new(&[status::OK], &[SUBMIT_ACCEPTED]);
        let outcome = controller
            .submit_job(&split_request(3), &mut channel, None)
            .unwrap();
        assert!(outcome.succeeded());
        assert_eq!(controller.preparer.seen.get(), 2);
    }

    #[test]
    fn cancellation_aborts_the_job() {
        let token = CancelToken::new();
        token.cancel();
        let mut channel = ScriptedChannel::new(&[status::OK], &[SUBMIT_ACCEPTED]);
        let result = fast_controller().submit_job(&request(1), &mut channel, Some(&token));
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
