use std::io::Write;
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn range(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next_f64() * (hi - lo) as f64) as i64
    }
}

/// `1234567` → `$1.234.567`, the way the source CSV writes amounts.
fn peso_text(amount: i64) -> String {
    let digits = amount.to_string();
    let mut out = String::from("$");
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

struct Project {
    year: i64,
    region: &'static str,
    sector: &'static str,
    innovation_type: &'static str,
    funding: i64,
    private: i64,
    certified: Option<i64>,
    activity_start: String,
}

const HEADERS: [&str; 8] = [
    "Año Adjudicacion",
    "Region",
    "Sector Economico",
    "Tipo Innovacion",
    "Financiamiento Innova",
    "Aprobado Privado Pecuniario",
    "Monto Certificado Ley",
    "Inicio Actividad Economica",
];

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);

    let regions = [
        "Metropolitana",
        "Valparaíso",
        "Biobío",
        "Maule",
        "Antofagasta",
        "Los Lagos",
        "Ñuble",
    ];
    let sectors = [
        "TIC",
        "Agrícola",
        "Salud",
        "Minería",
        "Manufactura",
        "Energía",
        "Alimentos",
    ];
    let types = ["Producto", "Proceso", "Servicio", "Modelo de Negocio"];

    let projects: Vec<Project> = (0..400)
        .map(|_| {
            let funding = rng.range(5, 200) * 1_000_000;
            let start_year = rng.range(1995, 2020);
            Project {
                year: rng.range(2010, 2024),
                region: rng.pick(&regions),
                sector: rng.pick(&sectors),
                innovation_type: rng.pick(&types),
                funding,
                private: funding * rng.range(10, 60) / 100,
                certified: (rng.next_f64() < 0.3).then(|| rng.range(1, 50) * 1_000_000),
                activity_start: format!(
                    "{start_year}-{:02}-{:02}",
                    rng.range(1, 13),
                    rng.range(1, 29)
                ),
            }
        })
        .collect();

    // ---- Version 1: semicolon CSV with peso-formatted amounts ----
    let csv_path = "sample_projects.csv";
    let mut csv = std::io::BufWriter::new(std::fs::File::create(csv_path)?);
    writeln!(csv, "{}", HEADERS.join(";"))?;
    for p in &projects {
        writeln!(
            csv,
            "{};{};{};{};{};{};{};{}",
            p.year,
            p.region,
            p.sector,
            p.innovation_type,
            peso_text(p.funding),
            peso_text(p.private),
            p.certified.map(peso_text).unwrap_or_else(|| "N/D".to_string()),
            p.activity_start
        )?;
    }
    csv.flush()?;

    // ---- Parquet with the same rows, amounts as integers ----
    let strings = |f: fn(&Project) -> &str| {
        StringArray::from(projects.iter().map(f).collect::<Vec<_>>())
    };
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Int64, false),
        Field::new(HEADERS[1], DataType::Utf8, false),
        Field::new(HEADERS[2], DataType::Utf8, false),
        Field::new(HEADERS[3], DataType::Utf8, false),
        Field::new(HEADERS[4], DataType::Int64, false),
        Field::new(HEADERS[5], DataType::Int64, false),
        Field::new(HEADERS[6], DataType::Int64, true),
        Field::new(HEADERS[7], DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(projects.iter().map(|p| p.year))),
            Arc::new(strings(|p| p.region)),
            Arc::new(strings(|p| p.sector)),
            Arc::new(strings(|p| p.innovation_type)),
            Arc::new(Int64Array::from_iter_values(projects.iter().map(|p| p.funding))),
            Arc::new(Int64Array::from_iter_values(projects.iter().map(|p| p.private))),
            Arc::new(Int64Array::from(
                projects.iter().map(|p| p.certified).collect::<Vec<_>>(),
            )),
            Arc::new(strings(|p| p.activity_start.as_str())),
        ],
    )?;

    let parquet_path = "sample_projects.parquet";
    let file = std::fs::File::create(parquet_path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!(
        "Wrote {} projects to {csv_path} and {parquet_path}",
        projects.len()
    );
    Ok(())
}
