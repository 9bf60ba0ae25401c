//! Synthetic DDF files for tests
#![allow(dead_code)]
use std::path::Path;

pub const HEADER_LEN: usize = 512;
pub const FRAME_HEADER_LEN: usize = 256;

/// One frame of a synthetic file
#[derive(Debug, Clone)]
pub struct Frame {
    pub pc_time: u32,
    /// year, month, day, hour, minute, second, hundredths
    pub clock: [u32; 7],
    pub window_start: u32,
    pub window_index: u32,
    pub flags: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// A classic-window frame at 2020-09-13 12:26:`second`.`hundredths`
    pub fn at(second: u32, hundredths: u32, payload_len: usize) -> Self {
        Frame {
            pc_time: 1_600_000_000 + second,
            clock: [2020, 9, 13, 12, 26, second, hundredths],
            window_start: 10,
            window_index: 2,
            flags: 0x1,
            payload: vec![0; payload_len],
        }
    }

    pub fn window(mut self, start: u32, index: u32, flags: u8) -> Self {
        self.window_start = start;
        self.window_index = index;
        self.flags = flags;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }
}

/// A DDF v3 file under construction
#[derive(Debug, Clone)]
pub struct Ddf {
    pub frame_rate: u32,
    pub resolution: u32,
    pub beams: u32,
    pub samples: u32,
    pub frames: Vec<Frame>,
}

impl Ddf {
    pub fn new(beams: u32, samples: u32) -> Self {
        Ddf {
            frame_rate: 15,
            resolution: 1,
            beams,
            samples,
            frames: Vec::new(),
        }
    }

    pub fn payload_len(&self) -> usize {
        (self.beams * self.samples) as usize
    }

    pub fn low_frequency(mut self) -> Self {
        self.resolution = 0;
        self
    }

    pub fn frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Three frames spaced 1.5 s apart
    pub fn three_frames(beams: u32, samples: u32) -> Self {
        let n = (beams * samples) as usize;
        Ddf::new(beams, samples)
            .frame(Frame::at(0, 0, n))
            .frame(Frame::at(1, 50, n))
            .frame(Frame::at(3, 0, n))
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut b = b"DDF\x03".to_vec();
        let fields = [
            self.frames.len() as u32,
            self.frame_rate,
            self.resolution,
            self.beams,
            0,
            self.samples,
        ];
        for v in fields {
            b.extend_from_slice(&v.to_le_bytes());
        }
        b.resize(HEADER_LEN, 0);

        for f in &self.frames {
            let start = b.len();
            b.extend_from_slice(&[0; 4]);
            b.extend_from_slice(&f.pc_time.to_le_bytes());
            b.resize(start + 20, 0);
            for v in f.clock {
                b.extend_from_slice(&v.to_le_bytes());
            }
            b.resize(start + 52, 0);
            b.extend_from_slice(&f.window_start.to_le_bytes());
            b.extend_from_slice(&f.window_index.to_le_bytes());
            b.resize(start + 192, 0);
            b.push(f.flags);
            b.resize(start + FRAME_HEADER_LEN, 0);
            b.extend_from_slice(&f.payload);
        }
        b
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.bytes())
    }
}
