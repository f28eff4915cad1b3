use std::{
    fmt,
    ops::{Deref, Range},
    sync::Arc,
};

use crate::{primitive::U24, string::RawString};

use super::{Deserialize, Elements, Error, ErrorKind, ResultContextExt, Scalar};

#[derive(Clone)]
enum Storage<'a> {
    Borrowed(&'a [u8]),
    Owned(Arc<[u8]>),
}

impl Deref for Storage<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Borrowed(bytes) => bytes,
            Storage::Owned(bytes) => bytes,
        }
    }
}

/// Immutable window over bytes with a movable cursor.
///
/// The bytes are either borrowed from a parent buffer or owned by the view (for decoded
/// copies). Sub-views made with [`ByteView::sub_view`] share whichever of the two the parent
/// has, so carving a view never copies. An owned buffer is released when the last view over
/// it is dropped.
///
/// Invariant: `start <= cursor <= end`. Every cursor movement goes through
/// [`ByteView::move_to`], which enforces it.
#[derive(Clone)]
pub struct ByteView<'a> {
    storage: Storage<'a>,
    start: usize,
    cursor: usize,
    end: usize,
}

impl<'a> ByteView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            start: 0,
            cursor: 0,
            end: bytes.len(),
            storage: Storage::Borrowed(bytes),
        }
    }

    pub fn owned(bytes: impl Into<Arc<[u8]>>) -> ByteView<'static> {
        let bytes = bytes.into();
        ByteView {
            start: 0,
            cursor: 0,
            end: bytes.len(),
            storage: Storage::Owned(bytes),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    /// Total length of the window.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Bytes left between the cursor and the end of the window.
    pub fn size(&self) -> usize {
        self.end - self.cursor
    }

    pub fn eof(&self) -> bool {
        self.cursor == self.end
    }

    pub fn tell(&self) -> usize {
        self.cursor - self.start
    }

    /// The whole window, regardless of the cursor.
    pub fn bytes(&self) -> &[u8] {
        &self.storage[self.start..self.end]
    }

    /// The bytes from the cursor to the end of the window.
    pub fn rest(&self) -> &[u8] {
        &self.storage[self.cursor..self.end]
    }

    fn move_to(&mut self, target: usize) -> Result<(), Error> {
        if target < self.start || target > self.end {
            return Err(ErrorKind::OutOfBounds.make(format!(
                "offset {} is outside of a view of {} bytes",
                target.wrapping_sub(self.start),
                self.len()
            )));
        }
        self.cursor = target;
        Ok(())
    }

    fn claim(&mut self, n: usize) -> Result<Range<usize>, Error> {
        let from = self.cursor;
        let to = from.checked_add(n).ok_or_else(|| {
            ErrorKind::OutOfBounds.make(format!("cannot claim {n} bytes at offset {}", self.tell()))
        })?;
        self.move_to(to).with_context(|| {
            format!(
                "need {n} bytes at offset {}, but only {} remain",
                self.tell(),
                self.size()
            )
        })?;
        Ok(from..to)
    }

    pub fn advance(&mut self, n: usize) -> Result<(), Error> {
        self.claim(n).map(|_| ())
    }

    /// Moves the cursor to `offset` bytes past the start of the window.
    pub fn seek(&mut self, offset: usize) -> Result<(), Error> {
        let target = self.start.checked_add(offset).ok_or_else(|| {
            ErrorKind::OutOfBounds.make(format!("cannot seek to offset {offset}"))
        })?;
        self.move_to(target)
    }

    /// Consumes `n` bytes and returns them without copying.
    pub fn take(&mut self, n: usize) -> Result<&[u8], Error> {
        let range = self.claim(n)?;
        Ok(&self.storage[range])
    }

    /// Copies exactly `dest.len()` bytes out of the view.
    pub fn read_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        let bytes = self.take(dest.len())?;
        dest.copy_from_slice(bytes);
        Ok(())
    }

    /// Typed look at the remaining bytes. Does not move the cursor.
    pub fn pointer<T: Scalar>(&self) -> Elements<'_, T> {
        Elements::new(self.rest())
    }

    /// Consumes `n` elements of `T` and returns them without copying.
    pub fn skip<T: Scalar>(&mut self, n: usize) -> Result<Elements<'_, T>, Error> {
        let length = n.checked_mul(T::SIZE).ok_or_else(|| {
            ErrorKind::OutOfBounds.make(format!("{n} elements of {} bytes overflow", T::SIZE))
        })?;
        let range = self.claim(length)?;
        Ok(Elements::new(&self.storage[range]))
    }

    /// Zero-copy view over `range`, relative to the start of this window.
    pub fn sub_view(&self, range: Range<usize>) -> Result<ByteView<'a>, Error> {
        if range.start > range.end || range.end > self.len() {
            return Err(ErrorKind::OutOfBounds.make(format!(
                "sub-view {}..{} does not fit in a view of {} bytes",
                range.start,
                range.end,
                self.len()
            )));
        }
        Ok(ByteView {
            storage: self.storage.clone(),
            start: self.start + range.start,
            cursor: self.start + range.start,
            end: self.start + range.end,
        })
    }

    /// Consumes `n` bytes as a zero-copy sub-view.
    pub fn take_view(&mut self, n: usize) -> Result<ByteView<'a>, Error> {
        let from = self.tell();
        self.advance(n)?;
        self.sub_view(from..from + n)
    }

    pub fn read<T>(&mut self) -> Result<T, Error>
    where
        T: Deserialize,
    {
        T::deserialize(self)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.read()
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        self.read()
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.read()
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        self.read()
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.read()
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.read()
    }

    /// Three bytes, zero-extended.
    pub fn read_u24(&mut self) -> Result<u32, Error> {
        self.read::<U24>().map(u32::from)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        self.read()
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        self.read()
    }

    pub fn read_float_q16(&mut self, min: f32, max: f32) -> Result<f32, Error> {
        let quantized = self.read_u16()?;
        Ok(quantized as f32 * (max - min) / 65535.0 + min)
    }

    pub fn read_float_q8(&mut self, min: f32, max: f32) -> Result<f32, Error> {
        let quantized = self.read_u8()?;
        Ok(quantized as f32 * (max - min) / 255.0 + min)
    }

    /// Fills `out` element by element.
    pub fn read_into<T>(&mut self, out: &mut [T]) -> Result<(), Error>
    where
        T: Deserialize,
    {
        let len = out.len();
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self
                .read()
                .with_context(|| format!("cannot read element {i} of {len}"))?;
        }
        Ok(())
    }

    /// Bulk copy of `n` contiguous scalars.
    pub fn read_seq<T: Scalar>(&mut self, n: usize) -> Result<Vec<T>, Error> {
        Ok(self.skip::<T>(n)?.to_vec())
    }

    /// Consumes a zero-terminated string and returns it without the terminator.
    pub fn skip_sz(&mut self) -> Result<&[u8], Error> {
        let length = self.rest().iter().position(|&b| b == 0).ok_or_else(|| {
            ErrorKind::OutOfBounds.make(format!("unterminated string at offset {}", self.tell()))
        })?;
        let range = self.claim(length + 1)?;
        Ok(&self.storage[range.start..range.end - 1])
    }

    pub fn read_sz(&mut self) -> Result<RawString, Error> {
        self.skip_sz().map(RawString::from)
    }

    /// Zero-terminated string occupying at most `max` bytes, terminator included.
    pub fn read_fixed_string(&mut self, max: usize) -> Result<RawString, Error> {
        let window = &self.rest()[..max.min(self.size())];
        match window.iter().position(|&b| b == 0) {
            Some(length) => {
                let string = RawString::from(&window[..length]);
                self.advance(length + 1)?;
                Ok(string)
            }
            None if window.len() < max => Err(ErrorKind::OutOfBounds
                .make(format!("unterminated string at offset {}", self.tell()))),
            None => Err(ErrorKind::StringTooLong.make(format!(
                "no terminator within {max} bytes at offset {}",
                self.tell()
            ))),
        }
    }

    /// Reads up to a CR, LF or CRLF terminator and discards it. The end of the view also ends
    /// a line.
    pub fn read_line(&mut self) -> Result<RawString, Error> {
        let rest = self.rest();
        let length = rest
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(rest.len());
        let terminator = match &rest[length..] {
            [b'\r', b'\n', ..] => 2,
            [_, ..] => 1,
            [] => 0,
        };
        let line = RawString::from(&rest[..length]);
        self.advance(length + terminator)?;
        Ok(line)
    }
}

impl fmt::Debug for ByteView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("owned", &self.is_owned())
            .field("len", &self.len())
            .field("tell", &self.tell())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_arithmetic() {
        let bytes = [1, 2, 3, 4, 5, 6];
        let mut view = ByteView::new(&bytes);
        assert_eq!((view.len(), view.size(), view.tell()), (6, 6, 0));

        view.advance(4).unwrap();
        assert_eq!((view.size(), view.tell()), (2, 4));
        assert!(!view.eof());

        view.advance(2).unwrap();
        assert!(view.eof());

        view.seek(1).unwrap();
        assert_eq!(view.rest(), &[2, 3, 4, 5, 6]);
    }

    #[test]
    fn bound_violations_leave_cursor_alone() {
        let bytes = [0; 4];
        let mut view = ByteView::new(&bytes);
        view.advance(3).unwrap();

        let error = view.advance(2).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::OutOfBounds);
        assert_eq!(view.tell(), 3);

        assert_eq!(view.seek(5).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(view.advance(usize::MAX).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(view.read_u16().unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(view.tell(), 3);
    }

    #[test]
    fn scalars_are_little_endian() {
        let bytes = [
            0x78, 0x56, 0x34, 0x12, // u32
            0xfe, 0xff, // i16
            0x01, 0x02, 0x03, // u24
            0x00, 0x00, 0x80, 0x3f, // f32 1.0
            0x02, // bool
        ];
        let mut view = ByteView::new(&bytes);
        assert_eq!(view.read_u32().unwrap(), 0x12345678);
        assert_eq!(view.read_i16().unwrap(), -2);
        assert_eq!(view.read_u24().unwrap(), 0x030201);
        assert_eq!(view.read_f32().unwrap(), 1.0);
        assert!(view.read_bool().unwrap());
        assert!(view.eof());
    }

    #[test]
    fn skip_and_pointer_are_zero_copy() {
        let bytes = [1, 0, 2, 0, 3, 0, 9];
        let mut view = ByteView::new(&bytes);
        assert_eq!(view.pointer::<u16>().len(), 3);

        let elements = view.skip::<u16>(2).unwrap();
        assert_eq!(elements.as_bytes().as_ptr(), bytes.as_ptr());
        assert_eq!(elements.to_vec(), vec![1, 2]);
        assert_eq!(view.read_seq::<u16>(1).unwrap(), vec![3]);
        assert_eq!(view.skip::<u16>(1).unwrap_err().kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn element_iterators_outlive_their_run() {
        let bytes = [4, 0, 5, 0, 6, 0];
        let view = ByteView::new(&bytes);
        let iter = {
            let elements = view.pointer::<u16>();
            elements.iter()
        };
        assert_eq!(iter.collect::<Vec<_>>(), vec![4, 5, 6]);
    }

    #[test]
    fn short_arrays_name_the_failing_element() {
        let bytes = [1, 0, 2, 0, 3];
        let mut view = ByteView::new(&bytes);
        let mut out = [0u16; 3];
        let error = view.read_into(&mut out).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::OutOfBounds);
        assert!(error.to_string().contains("cannot read element 2 of 3"));
        assert_eq!(out, [1, 2, 0]);
    }

    #[test]
    fn sub_views_share_storage() {
        let view = ByteView::owned(vec![10u8, 20, 30, 40, 50]);
        let mut sub = view.sub_view(1..4).unwrap();
        assert!(sub.is_owned());
        assert_eq!(sub.bytes(), &[20, 30, 40]);
        assert_eq!(sub.bytes().as_ptr(), view.bytes()[1..].as_ptr());

        sub.advance(3).unwrap();
        assert!(sub.eof());
        assert_eq!(sub.advance(1).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert!(view.sub_view(2..6).is_err());

        let nested = view.sub_view(1..4).unwrap().sub_view(1..2).unwrap();
        assert_eq!(nested.bytes(), &[30]);
    }

    #[test]
    fn zero_terminated_strings() {
        let bytes = b"level\0actor\0tail";
        let mut view = ByteView::new(bytes);
        assert_eq!(view.read_sz().unwrap(), "level");
        assert_eq!(view.skip_sz().unwrap(), b"actor");
        assert_eq!(view.read_sz().unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(view.rest(), b"tail");
    }

    #[test]
    fn fixed_strings_respect_the_limit() {
        let bytes = b"abc\0defgh\0";
        let mut view = ByteView::new(bytes);
        assert_eq!(view.read_fixed_string(4).unwrap(), "abc");

        let error = view.read_fixed_string(4).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StringTooLong);
        assert_eq!(view.tell(), 4);

        assert_eq!(view.read_fixed_string(64).unwrap(), "defgh");
        assert!(view.eof());
    }

    #[test]
    fn lines_drop_their_terminators() {
        let bytes = b"[section]\r\nkey = value\nlast";
        let mut view = ByteView::new(bytes);
        assert_eq!(view.read_line().unwrap(), "[section]");
        assert_eq!(view.read_line().unwrap(), "key = value");
        assert_eq!(view.read_line().unwrap(), "last");
        assert!(view.eof());
        assert_eq!(view.read_line().unwrap(), "");
    }

    #[test]
    fn quantized_floats_decode_linearly() {
        let bytes = [0xff, 0xff, 0x00, 0x80];
        let mut view = ByteView::new(&bytes);
        assert_eq!(view.read_float_q16(-1.0, 1.0).unwrap(), 1.0);
        assert_eq!(view.read_float_q8(0.0, 255.0).unwrap(), 0.0);
        assert_eq!(view.read_float_q8(0.0, 255.0).unwrap(), 128.0);
    }
}
