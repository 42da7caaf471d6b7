use bigdecimal::BigDecimal;
use chrono::{Local, NaiveDate};
use inventory_service::{InventoryError, InventoryStore, ReservationService};
use shared::{
    parse_reservation_date, Condition, StockBand, Tire, TireDraft, TireFilter, TireType, ValidationError,
    LOW_STOCK_THRESHOLD,
};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;

/// Brands offered by number when adding or editing a tire. Anything else can be typed in.
pub const BRANDS: [&str; 10] = [
    "Michelin",
    "Continental",
    "Vredestein",
    "Bridgestone",
    "Goodyear",
    "Dunlop",
    "Pirelli",
    "Hankook",
    "Kumho Tyres",
    "Hifly",
];

#[derive(Debug, Error)]
enum ActionError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("{0}")]
    Input(String),
}

impl From<ValidationError> for ActionError {
    fn from(e: ValidationError) -> Self {
        ActionError::Inventory(e.into())
    }
}

fn invalid(message: impl Into<String>) -> ActionError {
    ActionError::Input(message.into())
}

/// Interactive menu over any line reader and writer.
pub struct Console<R, W> {
    inventory: InventoryStore,
    reservations: ReservationService,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(inventory: InventoryStore, reservations: ReservationService, input: R, out: W) -> Self {
        Self {
            inventory,
            reservations,
            input,
            out,
        }
    }

    /// Runs the menu until the user picks 0 or the input ends.
    /// Failed actions are reported and the loop continues; only I/O errors end it.
    pub async fn run(&mut self) -> io::Result<()> {
        writeln!(self.out, "Tire inventory")?;
        loop {
            self.show_menu()?;
            let Some(choice) = self.read_line("Choice (0-8): ")? else {
                break;
            };
            let outcome = match choice.as_str() {
                "0" => break,
                "1" => self.show_inventory().await,
                "2" => self.add_tire().await,
                "3" => self.edit_tire().await,
                "4" => self.delete_tire().await,
                "5" => self.make_reservation().await,
                "6" => self.show_reservations(None).await,
                "7" => self.customer_reservations().await,
                "8" => self.export_csv().await,
                _ => Err(invalid("Invalid choice, pick 0-8")),
            };
            match outcome {
                Ok(()) => {}
                Err(ActionError::Io(e)) => return Err(e),
                Err(e) => writeln!(self.out, "Error: {}", e)?,
            }
        }
        writeln!(self.out, "Goodbye!")?;
        Ok(())
    }

    fn show_menu(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "1. Show inventory")?;
        writeln!(self.out, "2. Add tire")?;
        writeln!(self.out, "3. Edit tire")?;
        writeln!(self.out, "4. Delete tire")?;
        writeln!(self.out, "5. Make reservation")?;
        writeln!(self.out, "6. Show reservations")?;
        writeln!(self.out, "7. Reservations for a customer")?;
        writeln!(self.out, "8. Export CSV")?;
        writeln!(self.out, "0. Exit")
    }

    // None once the input is exhausted.
    fn read_line(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask(&mut self, label: &str) -> Result<String, ActionError> {
        self.read_line(label)?.ok_or_else(|| invalid("input closed"))
    }

    // An empty answer becomes None.
    fn ask_optional(&mut self, label: &str) -> Result<Option<String>, ActionError> {
        let answer = self.ask(label)?;
        Ok(Some(answer).filter(|a| !a.is_empty()))
    }

    fn ask_brand(&mut self, current: Option<&str>) -> Result<Option<String>, ActionError> {
        writeln!(self.out, "Brands:")?;
        for (i, brand) in BRANDS.iter().enumerate() {
            writeln!(self.out, "  {}. {}", i + 1, brand)?;
        }
        let label = match current {
            Some(current) => format!("Brand number or name [{}]: ", current),
            None => "Brand number or name: ".to_string(),
        };
        let Some(answer) = self.ask_optional(&label)? else {
            return Ok(None);
        };
        match answer.parse::<usize>() {
            Ok(n) => BRANDS
                .get(n.wrapping_sub(1))
                .map(|b| Some(b.to_string()))
                .ok_or_else(|| invalid(format!("Invalid brand number {}", n))),
            Err(_) => Ok(Some(answer)),
        }
    }

    fn ask_tire_type(&mut self, current: Option<TireType>) -> Result<Option<TireType>, ActionError> {
        writeln!(self.out, "Type: 1. summer  2. winter  3. all season")?;
        let label = match current {
            Some(current) => format!("Type [{}]: ", current),
            None => "Type: ".to_string(),
        };
        match self.ask_optional(&label)? {
            None => Ok(None),
            Some(answer) => pick_numbered(&answer, &TireType::ALL).map(Some),
        }
    }

    fn ask_condition(&mut self, current: Option<Condition>) -> Result<Option<Condition>, ActionError> {
        writeln!(self.out, "Condition: 1. new  2. used")?;
        let label = match current {
            Some(current) => format!("Condition [{}]: ", current),
            None => "Condition: ".to_string(),
        };
        match self.ask_optional(&label)? {
            None => Ok(None),
            Some(answer) => pick_numbered(&answer, &Condition::ALL).map(Some),
        }
    }

    fn ask_stock_band(&mut self) -> Result<Option<StockBand>, ActionError> {
        writeln!(self.out, "Stock: 1. in stock  2. low stock  3. out of stock")?;
        match self.ask_optional("Stock (Enter for all): ")? {
            None => Ok(None),
            Some(answer) => pick_numbered(&answer, &StockBand::ALL).map(Some),
        }
    }

    fn ask_stock(&mut self, label: &str) -> Result<Option<i32>, ActionError> {
        self.ask_optional(label)?
            .map(|s| s.parse::<i32>().map_err(|_| invalid(format!("Invalid stock '{}'", s))))
            .transpose()
    }

    fn choose_tire<'a>(&mut self, tires: &'a [Tire]) -> Result<&'a Tire, ActionError> {
        for (i, tire) in tires.iter().enumerate() {
            writeln!(
                self.out,
                "  {}. {} {} ({}, {}) stock {}",
                i + 1,
                tire.brand,
                tire.size,
                tire.tire_type,
                tire.condition,
                tire.stock
            )?;
        }
        let answer = self.ask("Tire number: ")?;
        answer
            .parse::<usize>()
            .ok()
            .and_then(|n| tires.get(n.wrapping_sub(1)))
            .ok_or_else(|| invalid(format!("Invalid tire number '{}'", answer)))
    }

    async fn show_inventory(&mut self) -> Result<(), ActionError> {
        for condition in Condition::ALL {
            let tires = self.inventory.list(&TireFilter::by_condition(condition)).await?;
            writeln!(self.out)?;
            writeln!(self.out, "== {} tires ({}) ==", condition, tires.len())?;
            for tire in &tires {
                let marker = if tire.stock < LOW_STOCK_THRESHOLD { "!" } else { " " };
                writeln!(
                    self.out,
                    "{} #{} {} {} {} stock {} price {}",
                    marker,
                    tire.id,
                    tire.brand,
                    tire.size,
                    tire.tire_type,
                    tire.stock,
                    format_price(tire)
                )?;
            }
        }

        let stats = self.inventory.stats().await?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "Total {} ({} new, {} used), {} units, {} low stock, {} out of stock",
            stats.total, stats.new_count, stats.used_count, stats.total_stock, stats.low_stock, stats.out_of_stock
        )?;
        Ok(())
    }

    async fn add_tire(&mut self) -> Result<(), ActionError> {
        let brand = self.ask_brand(None)?;
        let size = self.ask_optional("Size (e.g. 205/55R16): ")?;
        let tire_type = self.ask_tire_type(None)?;
        let condition = self.ask_condition(None)?;
        let stock = self.ask_stock("Stock: ")?;
        let price = self
            .ask_optional("Price (empty for none): ")?
            .map(|p| parse_price(&p))
            .transpose()?;

        let draft = TireDraft {
            brand,
            size,
            tire_type: tire_type.map(|t| t.as_str().to_string()),
            condition: condition.map(|c| c.as_str().to_string()),
            stock,
            price: Some(price),
        };
        let tire = self.inventory.create(draft).await?;
        writeln!(self.out, "Added {} {} (#{})", tire.brand, tire.size, tire.id)?;
        Ok(())
    }

    async fn edit_tire(&mut self) -> Result<(), ActionError> {
        let tires = self.inventory.list(&TireFilter::default()).await?;
        if tires.is_empty() {
            writeln!(self.out, "No tires in inventory")?;
            return Ok(());
        }
        let tire = self.choose_tire(&tires)?.clone();
        writeln!(self.out, "Press Enter to keep the current value")?;

        let brand = self.ask_brand(Some(&tire.brand))?;
        let size = self.ask_optional(&format!("Size [{}]: ", tire.size))?;
        let tire_type = self.ask_tire_type(Some(tire.tire_type))?;
        let condition = self.ask_condition(Some(tire.condition))?;
        let stock = self.ask_stock(&format!("Stock [{}]: ", tire.stock))?;
        let price = match self
            .ask_optional(&format!("Price [{}] ('-' clears): ", format_price(&tire)))?
            .as_deref()
        {
            None => None,
            Some("-") => Some(None),
            Some(p) => Some(Some(parse_price(p)?)),
        };

        let draft = TireDraft {
            brand,
            size,
            tire_type: tire_type.map(|t| t.as_str().to_string()),
            condition: condition.map(|c| c.as_str().to_string()),
            stock,
            price,
        };
        let updated = self.inventory.update(tire.id, draft).await?;
        writeln!(self.out, "Updated {} {} (#{})", updated.brand, updated.size, updated.id)?;
        Ok(())
    }

    async fn delete_tire(&mut self) -> Result<(), ActionError> {
        let tires = self.inventory.list(&TireFilter::default()).await?;
        if tires.is_empty() {
            writeln!(self.out, "No tires in inventory")?;
            return Ok(());
        }
        let tire = self.choose_tire(&tires)?.clone();
        let answer = self.ask(&format!("Delete {} {} and its reservations? (j/N): ", tire.brand, tire.size))?;
        if !matches!(answer.to_lowercase().as_str(), "j" | "y") {
            writeln!(self.out, "Cancelled")?;
            return Ok(());
        }
        self.inventory.delete(tire.id).await?;
        writeln!(self.out, "Deleted {} {}", tire.brand, tire.size)?;
        Ok(())
    }

    async fn make_reservation(&mut self) -> Result<(), ActionError> {
        let tires = self.inventory.available().await?;
        if tires.is_empty() {
            writeln!(self.out, "No tires available")?;
            return Ok(());
        }
        let tire = self.choose_tire(&tires)?.clone();
        let customer = self.ask("Customer name: ")?;
        let today = Local::now().date_naive();
        let date = match self.ask_optional(&format!("Date [{}]: ", today))? {
            Some(d) => parse_reservation_date(&d)?,
            None => today,
        };
        let notes = self.ask_optional("Notes: ")?;

        let reservation = self
            .reservations
            .reserve(tire.id, &customer, date, notes.as_deref())
            .await?;
        writeln!(
            self.out,
            "Reserved {} {} for {} on {}",
            tire.brand,
            tire.size,
            reservation.customer_name,
            format_date(reservation.reservation_date)
        )?;
        Ok(())
    }

    async fn show_reservations(&mut self, customer: Option<&str>) -> Result<(), ActionError> {
        let reservations = self.reservations.list_reservations(customer).await?;
        if reservations.is_empty() {
            writeln!(self.out, "No reservations found")?;
            return Ok(());
        }
        for details in &reservations {
            let r = &details.reservation;
            writeln!(self.out, "{} - {}", format_date(r.reservation_date), r.customer_name)?;
            writeln!(
                self.out,
                "    {} {} ({}, {})",
                details.brand, details.size, details.tire_type, details.condition
            )?;
            if let Some(notes) = &r.notes {
                writeln!(self.out, "    {}", notes)?;
            }
        }
        Ok(())
    }

    async fn customer_reservations(&mut self) -> Result<(), ActionError> {
        let Some(customer) = self.ask_optional("Customer name: ")? else {
            return Err(invalid("Customer name is required"));
        };
        self.show_reservations(Some(&customer)).await
    }

    async fn export_csv(&mut self) -> Result<(), ActionError> {
        let default = format!("tires_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self
            .ask_optional(&format!("File name [{}]: ", default))?
            .unwrap_or(default);
        writeln!(self.out, "Press Enter to export every tire")?;
        let filter = TireFilter {
            condition: self.ask_condition(None)?,
            stock_band: self.ask_stock_band()?,
            ..TireFilter::default()
        };
        let csv = self.inventory.export_csv(&filter).await?;
        std::fs::write(&path, csv).map_err(|e| invalid(format!("Could not write {}: {}", path, e)))?;
        writeln!(self.out, "Exported to {}", path)?;
        Ok(())
    }
}

fn pick_numbered<T: Copy>(answer: &str, options: &[T]) -> Result<T, ActionError> {
    answer
        .parse::<usize>()
        .ok()
        .and_then(|n| options.get(n.wrapping_sub(1)).copied())
        .ok_or_else(|| invalid(format!("Invalid choice '{}'", answer)))
}

fn parse_price(value: &str) -> Result<BigDecimal, ActionError> {
    BigDecimal::from_str(&value.replace(',', ".")).map_err(|_| invalid(format!("Invalid price '{}'", value)))
}

fn format_price(tire: &Tire) -> String {
    tire.price
        .as_ref()
        .map(|p| p.with_scale(2).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}
