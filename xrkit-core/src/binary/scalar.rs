use std::{fmt, marker::PhantomData};

/// Fixed-width little-endian value that can be decoded straight out of a byte slice.
pub trait Scalar: Copy + 'static {
    const SIZE: usize;

    /// Decodes from exactly `SIZE` bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! scalar_le {
    ($T:ty) => {
        impl Scalar for $T {
            const SIZE: usize = std::mem::size_of::<$T>();

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut buf = [0; std::mem::size_of::<$T>()];
                buf.copy_from_slice(bytes);
                <$T>::from_le_bytes(buf)
            }
        }
    };
}

scalar_le!(u8);
scalar_le!(u16);
scalar_le!(u32);
scalar_le!(u64);

scalar_le!(i8);
scalar_le!(i16);
scalar_le!(i32);
scalar_le!(i64);

scalar_le!(f32);
scalar_le!(f64);

/// Borrowed run of scalars, decoded on access.
///
/// Element boundaries carry no alignment requirement; every access decodes from bytes.
#[derive(Clone, Copy)]
pub struct Elements<'v, T> {
    bytes: &'v [u8],
    _marker: PhantomData<T>,
}

impl<'v, T> Elements<'v, T>
where
    T: Scalar + 'v,
{
    /// Trailing bytes that do not form a whole element are cut off.
    pub fn new(bytes: &'v [u8]) -> Self {
        let whole = bytes.len() - bytes.len() % T::SIZE;
        Self {
            bytes: &bytes[..whole],
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / T::SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(T::SIZE)?;
        let bytes = self.bytes.get(start..start.checked_add(T::SIZE)?)?;
        Some(T::from_le_slice(bytes))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'v {
        self.bytes.chunks_exact(T::SIZE).map(T::from_le_slice)
    }

    pub fn as_bytes(&self) -> &'v [u8] {
        self.bytes
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<T> fmt::Debug for Elements<'_, T>
where
    T: Scalar + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
