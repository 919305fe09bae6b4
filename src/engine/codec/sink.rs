use std::io::{self, Write};

/// Sink that only counts bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingSink {
    written: usize,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer over a pre-sized region that refuses to grow past it.
#[derive(Debug)]
pub struct FixedSizeWriter<'a> {
    buf: &'a mut [u8],
    position: usize,
}

impl<'a> FixedSizeWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }
}

impl Write for FixedSizeWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.len() > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "write of {} bytes at offset {} overflows buffer of {} bytes",
                    data.len(),
                    self.position,
                    self.buf.len()
                ),
            ));
        }
        let end = self.position + data.len();
        self.buf[self.position..end].copy_from_slice(data);
        self.position = end;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
