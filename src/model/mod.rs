//! The decoded DDF data model
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// The operating frequency of the sonar head
///
/// DIDSON heads switch between a low-frequency mode with longer range
/// and a high-frequency mode with finer resolution. The header stores
/// this as a flag where zero means low frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Deserialize, Serialize)]
pub enum Resolution {
    /// Low frequency (LF)
    Low,
    /// High frequency (HF)
    High,
}

impl From<u32> for Resolution {
    fn from(flag: u32) -> Self {
        if flag == 0 {
            Resolution::Low
        } else {
            Resolution::High
        }
    }
}

/// The encoding of the acquisition window of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Deserialize, Serialize)]
pub enum WindowMode {
    /// Classic windows
    Classic,
    /// Extended windows at standard range
    ExtendedStandard,
    /// Extended windows at long range
    ExtendedLongRange,
}

impl WindowMode {
    /// Derive the window mode from the first configuration byte of a frame
    ///
    /// Bit 0 set means classic windows. Otherwise bit 1 selects long range.
    pub fn from_flags(flags: u8) -> Self {
        if flags & 0x1 == 1 {
            WindowMode::Classic
        } else if (flags >> 1) & 0x1 == 1 {
            WindowMode::ExtendedLongRange
        } else {
            WindowMode::ExtendedStandard
        }
    }

    fn start_multiplier(self) -> f64 {
        match self {
            WindowMode::Classic => 0.375,
            WindowMode::ExtendedStandard | WindowMode::ExtendedLongRange => 0.42,
        }
    }

    fn length_options(self) -> [f64; 6] {
        match self {
            WindowMode::Classic => [1.125, 2.25, 4.5, 9.0, 18.0, 36.0],
            WindowMode::ExtendedStandard => [1.25, 2.5, 5.0, 10.0, 20.0, 40.0],
            WindowMode::ExtendedLongRange => [2.5, 5.0, 10.0, 20.0, 40.0, 80.0],
        }
    }
}

/// The range window sampled by a frame, in meters
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Window {
    /// Distance from the head to the first sample
    pub start: f64,
    /// Length of the sampled window
    pub length: f64,
}

impl Window {
    /// Decode the raw window fields of a frame
    ///
    /// Low-frequency files shift the length index up by two and double
    /// the start multiplier. Returns `None` when the shifted index falls
    /// outside the six entries of the length table.
    ///
    /// ```
    /// # use didson::model::{Resolution, Window, WindowMode};
    /// let w = Window::decode(WindowMode::Classic, Resolution::Low, 10, 2).unwrap();
    /// assert_eq!(w.start, 7.5);
    /// assert_eq!(w.length, 18.0);
    /// ```
    pub fn decode(
        mode: WindowMode,
        resolution: Resolution,
        raw_start: u32,
        length_index: u32,
    ) -> Option<Window> {
        let mut multiplier = mode.start_multiplier();
        let mut index = u64::from(length_index);
        if resolution == Resolution::Low {
            index += 2;
            multiplier *= 2.0;
        }
        let length = *mode.length_options().get(usize::try_from(index).ok()?)?;
        Some(Window {
            start: f64::from(raw_start) * multiplier,
            length,
        })
    }
}

/// Metadata of a single frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    /// Zero-based position of the frame in the file
    pub index: u32,
    /// Capture time from the acquisition computer clock
    pub pc_time: OffsetDateTime,
    /// Capture time from the sonar clock
    pub sonar_time: PrimitiveDateTime,
    /// The acquisition window
    pub window: Window,
}

/// A one-row summary of a DDF file
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Computer clock time of the first frame
    pub pc_time_from: OffsetDateTime,
    /// Computer clock time of the last frame
    pub pc_time_to: OffsetDateTime,
    /// Sonar clock time of the first frame
    pub sonar_time_from: PrimitiveDateTime,
    /// Sonar clock time of the last frame
    pub sonar_time_to: PrimitiveDateTime,
    /// Recording length in whole seconds
    ///
    /// Measured from the second frame to the last one.
    pub duration: Duration,
    /// Nominal frames per second
    pub frame_rate: u32,
    /// Number of beams per frame
    pub beam_count: u32,
    /// Number of samples per beam
    pub samples_per_beam: u32,
    /// Distinct window starts, in order of first appearance
    pub window_starts: Vec<f64>,
    /// Distinct window lengths, in order of first appearance
    pub window_lengths: Vec<f64>,
}

impl Summary {
    /// The ten ledger columns of this summary
    pub fn fields(&self) -> [String; 10] {
        [
            format_pc_time(self.pc_time_from),
            format_pc_time(self.pc_time_to),
            format_sonar_time(self.sonar_time_from),
            format_sonar_time(self.sonar_time_to),
            format_duration(self.duration),
            self.frame_rate.to_string(),
            self.beam_count.to_string(),
            self.samples_per_beam.to_string(),
            join_values(&self.window_starts),
            join_values(&self.window_lengths),
        ]
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fields().join(","))
    }
}

/// The full intensity data of a DDF file
#[derive(Debug, Clone)]
pub struct Volume {
    /// Sonar clock time of every frame, to the whole second
    pub timestamps: Vec<PrimitiveDateTime>,
    /// Intensities indexed by `[frame, beam, sample]`
    pub data: Array3<u8>,
}

impl Volume {
    /// Number of frames in the volume
    pub fn frame_count(&self) -> usize {
        self.data.shape()[0]
    }
}

/// Format a computer clock time as `YYYY-MM-DD HH:MM:SS`
pub fn format_pc_time(t: OffsetDateTime) -> String {
    t.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_default()
}

/// Format a sonar clock time as `YYYY-MM-DD HH:MM:SS.mmm`
///
/// Sub-millisecond digits are truncated.
pub fn format_sonar_time(t: PrimitiveDateTime) -> String {
    t.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ))
    .unwrap_or_default()
}

/// Format a duration as `HH:MM:SS.mmm`
pub fn format_duration(d: Duration) -> String {
    let sign = if d.is_negative() { "-" } else { "" };
    let d = d.abs();
    let secs = d.whole_seconds();
    let millis = d.subsec_milliseconds();
    format!(
        "{}{:02}:{:02}:{:02}.{:03}",
        sign,
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis
    )
}

/// Format a window value the way the ledger has always shown it
///
/// Whole numbers keep one fractional digit (`18.0`), everything else uses
/// the shortest representation that round-trips.
pub fn format_value(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

fn join_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_value(*v))
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn window_mode_flags() {
        assert_eq!(WindowMode::from_flags(0b01), WindowMode::Classic);
        assert_eq!(WindowMode::from_flags(0b11), WindowMode::Classic);
        assert_eq!(WindowMode::from_flags(0b00), WindowMode::ExtendedStandard);
        assert_eq!(WindowMode::from_flags(0b10), WindowMode::ExtendedLongRange);
        assert_eq!(WindowMode::from_flags(0xf4), WindowMode::ExtendedStandard);
    }

    #[test]
    fn window_table() {
        let modes = [
            (
                WindowMode::Classic,
                0.375,
                [1.125, 2.25, 4.5, 9.0, 18.0, 36.0],
            ),
            (
                WindowMode::ExtendedStandard,
                0.42,
                [1.25, 2.5, 5.0, 10.0, 20.0, 40.0],
            ),
            (
                WindowMode::ExtendedLongRange,
                0.42,
                [2.5, 5.0, 10.0, 20.0, 40.0, 80.0],
            ),
        ];
        for (mode, multiplier, lengths) in modes {
            for (i, length) in lengths.iter().enumerate() {
                let hf = Window::decode(mode, Resolution::High, 10, i as u32).unwrap();
                assert_eq!(hf.start, 10.0 * multiplier);
                assert_eq!(hf.length, *length);

                // LF indices are stored two below the table entry
                if i >= 2 {
                    let lf = Window::decode(mode, Resolution::Low, 10, i as u32 - 2).unwrap();
                    assert_eq!(lf.start, 10.0 * (multiplier * 2.0));
                    assert_eq!(lf.length, *length);
                }
            }
        }
    }

    #[test]
    fn window_examples() {
        let hf = Window::decode(WindowMode::Classic, Resolution::High, 10, 2).unwrap();
        assert_eq!((hf.start, hf.length), (3.75, 4.5));
        let lf = Window::decode(WindowMode::Classic, Resolution::Low, 10, 2).unwrap();
        assert_eq!((lf.start, lf.length), (7.5, 18.0));
    }

    #[test]
    fn window_index_out_of_range() {
        assert!(Window::decode(WindowMode::Classic, Resolution::High, 0, 6).is_none());
        assert!(Window::decode(WindowMode::ExtendedStandard, Resolution::Low, 0, 4).is_none());
        assert!(Window::decode(WindowMode::ExtendedLongRange, Resolution::Low, 0, u32::MAX).is_none());
    }

    #[test]
    fn resolution_flag() {
        assert_eq!(Resolution::from(0), Resolution::Low);
        assert_eq!(Resolution::from(1), Resolution::High);
        assert_eq!(Resolution::from(7), Resolution::High);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::seconds(3)), "00:00:03.000");
        assert_eq!(format_duration(Duration::seconds(3725)), "01:02:05.000");
        assert_eq!(format_duration(Duration::seconds(-65)), "-00:01:05.000");
    }

    #[test]
    fn times() {
        let t = datetime!(2021-03-04 05:06:07.891234);
        assert_eq!(format_sonar_time(t), "2021-03-04 05:06:07.891");
        assert_eq!(
            format_pc_time(datetime!(2021-03-04 05:06:07 UTC)),
            "2021-03-04 05:06:07"
        );
    }

    #[test]
    fn values() {
        assert_eq!(format_value(18.0), "18.0");
        assert_eq!(format_value(3.75), "3.75");
        assert_eq!(format_value(4.2), "4.2");
        assert_eq!(join_values(&[3.75, 18.0]), "3.75;18.0");
    }
}
