//! Fork-join helpers over contiguous slices, falling back to serial loops
//! when the `parallel` feature is off or parallelism is disabled at run time.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use glam::Vec3;

use crate::collision::contact::{evaluate_slice, ContactInput, ContactLaw, ContactOutput};

/// Contacts handed to one task; a multiple of the lane width.
pub const CONTACT_CHUNK: usize = 256;

/// Evaluates every contact into its own output slot.
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
pub fn evaluate_contacts(law: &ContactLaw, inputs: &[ContactInput], parallel: bool) -> Vec<ContactOutput> {
    let mut outputs = vec![ContactOutput::default(); inputs.len()];
    #[cfg(feature = "parallel")]
    {
        if parallel && inputs.len() > CONTACT_CHUNK {
            outputs
                .par_chunks_mut(CONTACT_CHUNK)
                .zip(inputs.par_chunks(CONTACT_CHUNK))
                .for_each(|(out, chunk)| evaluate_slice(law, chunk, out));
            return outputs;
        }
    }
    evaluate_slice(law, inputs, &mut outputs);
    outputs
}

/// Applies `f` to matching elements of three equally long slices.
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
pub fn for_each_zip3<A, B, C, F>(a: &mut [A], b: &mut [B], c: &[C], parallel: bool, f: F)
where
    A: Send,
    B: Send,
    C: Sync,
    F: Fn(&mut A, &mut B, &C) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            a.par_iter_mut()
                .zip(b.par_iter_mut())
                .zip(c.par_iter())
                .for_each(|((a, b), c)| f(a, b, c));
            return;
        }
    }
    a.iter_mut()
        .zip(b.iter_mut())
        .zip(c)
        .for_each(|((a, b), c)| f(a, b, c));
}

/// Largest vector length in `values`.
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
pub fn max_length(values: &[Vec3], parallel: bool) -> f32 {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            return values
                .par_iter()
                .map(|v| v.length())
                .reduce(|| 0.0, f32::max);
        }
    }
    values.iter().map(|v| v.length()).fold(0.0, f32::max)
}

/// Runs `f` for every index in `0..len`, keeping the output order.
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
pub fn map_indices<R, F>(len: usize, parallel: bool, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            return (0..len).into_par_iter().map(f).collect();
        }
    }
    (0..len).map(f).collect()
}
