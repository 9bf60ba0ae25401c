//! Parsing DIDSON DDF files
//!
//! Only version 3 of the format is supported. A file is a 512 byte
//! header followed by `frame_count` frames, each made of a 256 byte
//! frame header and `beam_count * samples_per_beam` intensity bytes.
use crate::error::{Error, Result};
use crate::model::{FrameInfo, Resolution, Summary, Volume, Window, WindowMode};
use binrw::{binread, BinRead};
use ndarray::{Array3, ArrayView2, Axis, ShapeBuilder};
use std::io::{Read, Seek, SeekFrom};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Size of the file header, signature and version included
pub const HEADER_LEN: u64 = 512;
/// Size of the metadata block at the start of every frame
pub const FRAME_HEADER_LEN: u64 = 256;

const SIGNATURE: &[u8; 3] = b"DDF";
const VERSION: u8 = 3;

/// The file header that follows the signature and version byte
#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    frame_count: u32,
    frame_rate: u32,
    resolution: u32,
    beam_count: u32,
    #[br(pad_before = 4, pad_after = 484)]
    samples_per_beam: u32,
}

impl Header {
    /// Number of frames in the file
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Nominal frames per second
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Operating frequency of the head
    pub fn resolution(&self) -> Resolution {
        Resolution::from(self.resolution)
    }

    /// Number of beams in each frame
    pub fn beam_count(&self) -> u32 {
        self.beam_count
    }

    /// Number of samples in each beam
    pub fn samples_per_beam(&self) -> u32 {
        self.samples_per_beam
    }

    /// Size of the intensity payload of one frame
    pub fn payload_len(&self) -> u64 {
        u64::from(self.beam_count) * u64::from(self.samples_per_beam)
    }

    /// Size of one frame, metadata included
    pub fn frame_len(&self) -> u64 {
        FRAME_HEADER_LEN + self.payload_len()
    }
}

/// The sonar clock of a frame, without the sub-second field
#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl Clock {
    fn to_datetime(self, microsecond: u32, frame: u32) -> Result<PrimitiveDateTime> {
        let small = |name: &str, value: u32| {
            u8::try_from(value)
                .map_err(|_| Error::corrupt(frame, format!("{} {} out of range", name, value)))
        };
        let invalid = |e: time::error::ComponentRange| Error::corrupt(frame, e.to_string());

        let year = i32::try_from(self.year)
            .map_err(|_| Error::corrupt(frame, format!("year {} out of range", self.year)))?;
        let month = Month::try_from(small("month", self.month)?).map_err(invalid)?;
        let date = Date::from_calendar_date(year, month, small("day", self.day)?).map_err(invalid)?;
        let time = Time::from_hms_micro(
            small("hour", self.hour)?,
            small("minute", self.minute)?,
            small("second", self.second)?,
            microsecond,
        )
        .map_err(invalid)?;
        Ok(PrimitiveDateTime::new(date, time))
    }
}

/// The metadata block of a frame
#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    #[br(pad_before = 4, pad_after = 12)]
    pc_time: u32,
    clock: Clock,
    #[br(pad_after = 4)]
    hundredths: u32,
    window_start: u32,
    #[br(pad_after = 132)]
    window_length_index: u32,
    // Only the first byte of the configuration word is used; the block
    // ends with 60 reserved bytes.
    #[br(pad_after = 63)]
    configuration: u8,
}

impl FrameHeader {
    fn decode(&self, index: u32, resolution: Resolution) -> Result<FrameInfo> {
        let pc_time = OffsetDateTime::from_unix_timestamp(i64::from(self.pc_time))
            .map_err(|e| Error::corrupt(index, e.to_string()))?;
        let microsecond = self.hundredths.checked_mul(10_000).ok_or_else(|| {
            Error::corrupt(index, format!("hundredths {} out of range", self.hundredths))
        })?;
        let sonar_time = self.clock.to_datetime(microsecond, index)?;
        let window = Window::decode(
            WindowMode::from_flags(self.configuration),
            resolution,
            self.window_start,
            self.window_length_index,
        )
        .ok_or_else(|| {
            Error::corrupt(
                index,
                format!(
                    "window length index {} out of range",
                    self.window_length_index
                ),
            )
        })?;
        Ok(FrameInfo {
            index,
            pc_time,
            sonar_time,
            window,
        })
    }
}

/// The part of a frame header needed to build a [`Volume`]
#[binread]
#[br(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VolumeFrameHeader {
    #[br(pad_before = 20, pad_after = 212)]
    clock: Clock,
}

/// Check the signature and version byte at the start of a stream
///
/// Nothing beyond the first four bytes is read.
fn read_preamble<R: Read>(reader: &mut R) -> Result<()> {
    let mut signature = Vec::with_capacity(3);
    reader.by_ref().take(3).read_to_end(&mut signature)?;
    if signature != SIGNATURE {
        return Err(Error::InvalidFormat);
    }
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != VERSION {
        return Err(Error::UnsupportedVersion(version[0]));
    }
    Ok(())
}

/// Byte offset of frame `n` from the start of the file
///
/// Frames have a fixed stride, so this needs nothing but the header.
/// Returns `None` when the offset does not fit in a `u64`.
pub fn frame_offset(header: &Header, n: u32) -> Option<u64> {
    u64::from(n)
        .checked_mul(header.frame_len())?
        .checked_add(HEADER_LEN)
}

/// An iterator interface to the frames of a DDF file
///
/// Frames are walked in order. The intensity payload of each frame is
/// skipped over, so only the metadata is decoded.
pub struct File<T>
where
    T: Read + Seek,
{
    header: Header,
    reader: T,
    next_frame: u32,
}

impl<T> File<T>
where
    T: Read + Seek,
{
    /// Validate the signature and version and read the file header
    pub fn new(mut reader: T) -> Result<Self> {
        read_preamble(&mut reader)?;
        let header = Header::read(&mut reader)?;
        Ok(File {
            header,
            reader,
            next_frame: 0,
        })
    }

    /// Return a reference to the file Header
    pub fn header(&self) -> &Header {
        &self.header
    }

    fn read_frame(&mut self) -> Result<FrameInfo> {
        let index = self.next_frame;
        let raw = FrameHeader::read(&mut self.reader)?;
        let skip = i64::try_from(self.header.payload_len())
            .map_err(|_| Error::corrupt(index, "payload too large"))?;
        self.reader.seek(SeekFrom::Current(skip))?;
        raw.decode(index, self.header.resolution())
    }
}

impl<T: Read + Seek> Iterator for File<T> {
    type Item = Result<FrameInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_frame >= self.header.frame_count {
            return None;
        }
        let res = self.read_frame();
        self.next_frame = if res.is_ok() {
            self.next_frame + 1
        } else {
            self.header.frame_count
        };
        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.header.frame_count - self.next_frame) as usize;
        (0, Some(left))
    }
}

fn push_distinct(values: &mut Vec<f64>, value: f64) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Summarize a DDF file in a single record
///
/// Every frame is visited so that all window settings used in the file
/// are reported. The duration is measured from the second frame, not the
/// first, to the last one, rounded to whole seconds.
///
/// The reader is consumed and dropped before returning.
pub fn decode_summary<T: Read + Seek>(reader: T) -> Result<Summary> {
    let file = File::new(reader)?;
    let header = *file.header();
    if header.frame_count == 0 {
        return Err(Error::NoFrames);
    }

    let mut first: Option<FrameInfo> = None;
    let mut last: Option<FrameInfo> = None;
    let mut baseline: Option<PrimitiveDateTime> = None;
    let mut window_starts = Vec::new();
    let mut window_lengths = Vec::new();

    for frame in file {
        let frame = frame?;
        push_distinct(&mut window_starts, frame.window.start);
        push_distinct(&mut window_lengths, frame.window.length);
        if frame.index == 1 {
            baseline = Some(frame.sonar_time);
        }
        if first.is_none() {
            first = Some(frame.clone());
        }
        last = Some(frame);
    }

    let (Some(first), Some(last)) = (first, last) else {
        return Err(Error::NoFrames);
    };
    let elapsed = last.sonar_time - baseline.unwrap_or(first.sonar_time);
    let duration = Duration::seconds(elapsed.as_seconds_f64().round_ties_even() as i64);

    log::debug!(
        "summarized {} frames, {} window setting(s)",
        header.frame_count,
        window_starts.len().max(window_lengths.len())
    );

    Ok(Summary {
        pc_time_from: first.pc_time,
        pc_time_to: last.pc_time,
        sonar_time_from: first.sonar_time,
        sonar_time_to: last.sonar_time,
        duration,
        frame_rate: header.frame_rate,
        beam_count: header.beam_count,
        samples_per_beam: header.samples_per_beam,
        window_starts,
        window_lengths,
    })
}

/// Read every frame of a DDF file into a `[frame, beam, sample]` volume
///
/// Payload bytes are stored with the beam index varying fastest, so each
/// frame is assembled in column-major order into a `[beam, sample]`
/// image. Timestamps carry whole seconds only.
///
/// The reader is consumed and dropped before returning.
pub fn decode_volume<T: Read + Seek>(mut reader: T) -> Result<Volume> {
    read_preamble(&mut reader)?;
    let header = Header::read(&mut reader)?;
    if header.frame_count == 0 {
        return Err(Error::NoFrames);
    }

    let start = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(start))?;
    let expected = u64::from(header.frame_count)
        .checked_mul(header.frame_len())
        .and_then(|n| n.checked_add(start))
        .unwrap_or(u64::MAX);
    if expected > end {
        return Err(Error::Truncated {
            expected,
            actual: end,
        });
    }

    let frames = header.frame_count as usize;
    let beams = header.beam_count as usize;
    let samples = header.samples_per_beam as usize;

    let mut data = Array3::<u8>::zeros((frames, beams, samples));
    let mut timestamps = Vec::with_capacity(frames);
    let mut payload = vec![0u8; beams * samples];

    for index in 0..header.frame_count {
        let frame = VolumeFrameHeader::read(&mut reader)?;
        timestamps.push(frame.clock.to_datetime(0, index)?);

        reader.read_exact(&mut payload)?;
        let image = ArrayView2::from_shape((beams, samples).f(), &payload[..])
            .map_err(|e| Error::corrupt(index, e.to_string()))?;
        data.index_axis_mut(Axis(0), index as usize).assign(&image);
    }

    log::debug!(
        "read volume of {} frames, {} beams, {} samples",
        frames,
        beams,
        samples
    );

    Ok(Volume { timestamps, data })
}
