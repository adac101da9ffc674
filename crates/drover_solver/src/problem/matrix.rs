/// Square matrix over a flat buffer: `index = from * size + to`.
#[derive(Clone, Debug)]
pub struct Matrix {
    size: usize,
    data: Vec<u32>,
}

impl Matrix {
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }

        Some(Matrix {
            size,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn constant(size: usize, value: u32) -> Self {
        Matrix {
            size,
            data: vec![value; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn get(&self, from: usize, to: usize) -> u32 {
        self.data[from * self.size + to]
    }

    pub fn set(&mut self, from: usize, to: usize, value: u32) {
        self.data[from * self.size + to] = value;
    }
}
